//! Field validation errors.

use voxsign_types::Locale;

/// Why a value was rejected for a form field.
///
/// The `Display` text is the English message; use [`FieldError::message`]
/// for the user's locale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("this field is required")]
    Required,

    #[error("name may only contain letters, spaces, apostrophes and hyphens")]
    NameInvalid,

    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },

    #[error("username must be between {min} and {max} characters")]
    UsernameLength { min: usize, max: usize },

    #[error("username may only contain lowercase letters, digits and underscores")]
    UsernameInvalid,

    #[error("email address is not valid")]
    EmailInvalid,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("date of birth must be in YYYY-MM-DD format")]
    DobInvalid,

    #[error("date of birth cannot be in the future")]
    DobInFuture,

    #[error("you must be at least {min_age} years old")]
    TooYoung { min_age: u32 },

    #[error("you must accept the terms to continue")]
    TermsNotAccepted,
}

impl FieldError {
    /// Returns the message shown inline under the field.
    pub fn message(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.to_string(),
            Locale::Ar => match self {
                Self::Required => "هذا الحقل مطلوب".to_string(),
                Self::NameInvalid => {
                    "يجب أن يحتوي الاسم على حروف ومسافات وشرطات فقط".to_string()
                }
                Self::NameTooLong { max } => format!("يجب ألا يتجاوز الاسم {} حرفًا", max),
                Self::UsernameLength { min, max } => {
                    format!("يجب أن يكون اسم المستخدم بين {} و {} حرفًا", min, max)
                }
                Self::UsernameInvalid => {
                    "يجب أن يحتوي اسم المستخدم على أحرف إنجليزية صغيرة وأرقام وشرطة سفلية فقط"
                        .to_string()
                }
                Self::EmailInvalid => "البريد الإلكتروني غير صالح".to_string(),
                Self::PasswordTooShort { min } => {
                    format!("يجب أن تتكون كلمة المرور من {} أحرف على الأقل", min)
                }
                Self::PasswordMismatch => "كلمتا المرور غير متطابقتين".to_string(),
                Self::DobInvalid => {
                    "يجب أن يكون تاريخ الميلاد بالصيغة YYYY-MM-DD".to_string()
                }
                Self::DobInFuture => "لا يمكن أن يكون تاريخ الميلاد في المستقبل".to_string(),
                Self::TooYoung { min_age } => {
                    format!("يجب أن يكون عمرك {} عامًا على الأقل", min_age)
                }
                Self::TermsNotAccepted => "يجب الموافقة على الشروط للمتابعة".to_string(),
            },
        }
    }
}
