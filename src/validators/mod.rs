//! Input validation for passwords, phone numbers and emails.

pub mod email;
pub mod password;
pub mod phone;

pub use email::validate_email;
pub use password::{PasswordPolicy, validate_password};
pub use phone::{normalize_phone_number, validate_phone_number};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
    PasswordEmpty,
    PasswordTooShort(usize),
    PasswordTooLong(usize),
    PhoneNumberEmpty,
    PhoneNumberInvalid,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Email cannot be empty"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Invalid email format"),
            Self::PasswordEmpty => write!(f, "Password cannot be empty"),
            Self::PasswordTooShort(min) => {
                write!(f, "Password must be at least {min} characters")
            }
            Self::PasswordTooLong(max) => {
                write!(f, "Password is too long (max {max} characters)")
            }
            Self::PhoneNumberEmpty => write!(f, "Phone number cannot be empty"),
            Self::PhoneNumberInvalid => write!(f, "Invalid phone number"),
        }
    }
}

impl std::error::Error for ValidationError {}
