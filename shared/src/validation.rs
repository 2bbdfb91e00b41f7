//! Validation utilities for AgriQ
//!
//! Includes Argentina-specific validations (CUIT, phone numbers) for
//! compliance with local invoicing requirements.

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate a unit quantity is positive
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a discrepancy quantity is not negative
pub fn validate_discrepancy(discrepancy: i32) -> Result<(), &'static str> {
    if discrepancy < 0 {
        return Err("Discrepancy cannot be negative");
    }
    Ok(())
}

/// Validate product code format (3-12 uppercase alphanumeric, dashes allowed)
pub fn validate_product_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Product code must be at least 3 characters");
    }
    if code.len() > 12 {
        return Err("Product code must be at most 12 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Product code must be uppercase alphanumeric with dashes only");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

// ============================================================================
// Argentina-Specific Validations
// ============================================================================

/// Validate an Argentine CUIT (Clave Única de Identificación Tributaria)
///
/// 11-digit number with a modulo-11 check digit. Accepts formats with or
/// without dashes: 20-12345678-6, 20123456786.
pub fn validate_cuit(cuit: &str) -> Result<(), &'static str> {
    let digits: Vec<u32> = cuit.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 {
        return Err("CUIT must be 11 digits");
    }

    const WEIGHTS: [u32; 10] = [5, 4, 3, 2, 7, 6, 5, 4, 3, 2];
    let sum: u32 = digits
        .iter()
        .take(10)
        .zip(WEIGHTS.iter())
        .map(|(d, w)| d * w)
        .sum();

    let check = match 11 - (sum % 11) {
        11 => 0,
        10 => 9,
        v => v,
    };

    if check != digits[10] {
        return Err("Invalid CUIT check digit");
    }

    Ok(())
}

/// Validate an Argentine phone number
/// Accepts: 1123456789, 11-2345-6789, +541123456789, +5491123456789
pub fn validate_argentine_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Area code + number: 10 digits (e.g., 1123456789)
    if digits.len() == 10 {
        return Ok(());
    }
    // With country code 54: 12 digits
    if digits.len() == 12 && digits.starts_with("54") {
        return Ok(());
    }
    // Mobile with country code 549: 13 digits
    if digits.len() == 13 && digits.starts_with("549") {
        return Ok(());
    }

    Err("Invalid Argentine phone number format")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Inventory Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_validate_discrepancy() {
        assert!(validate_discrepancy(0).is_ok());
        assert!(validate_discrepancy(3).is_ok());
        assert!(validate_discrepancy(-1).is_err());
    }

    #[test]
    fn test_validate_product_code_valid() {
        assert!(validate_product_code("TOM").is_ok());
        assert!(validate_product_code("TOM-CHE").is_ok());
        assert!(validate_product_code("LEC123").is_ok());
    }

    #[test]
    fn test_validate_product_code_invalid() {
        assert!(validate_product_code("TO").is_err()); // Too short
        assert!(validate_product_code("ABCDEFGHIJKLM").is_err()); // Too long
        assert!(validate_product_code("tom").is_err()); // Lowercase
        assert!(validate_product_code("TOM_CHE").is_err()); // Underscore
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.com.ar").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }

    // ========================================================================
    // Argentina-Specific Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_cuit_valid() {
        assert!(validate_cuit("20000000001").is_ok());
        assert!(validate_cuit("30000000007").is_ok());
        // With dashes
        assert!(validate_cuit("20-00000000-1").is_ok());
    }

    #[test]
    fn test_validate_cuit_invalid() {
        // Wrong length
        assert!(validate_cuit("123456789").is_err());
        // Bad check digit
        assert!(validate_cuit("20000000002").is_err());
        assert!(validate_cuit("abcdefghijk").is_err());
    }

    #[test]
    fn test_validate_argentine_phone_valid() {
        assert!(validate_argentine_phone("1123456789").is_ok());
        assert!(validate_argentine_phone("11-2345-6789").is_ok());
        assert!(validate_argentine_phone("+541123456789").is_ok());
        assert!(validate_argentine_phone("+5491123456789").is_ok());
    }

    #[test]
    fn test_validate_argentine_phone_invalid() {
        assert!(validate_argentine_phone("12345").is_err());
        assert!(validate_argentine_phone("12345678901234").is_err());
        assert!(validate_argentine_phone("abcdefghij").is_err());
    }
}
