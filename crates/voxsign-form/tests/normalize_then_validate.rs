use chrono::NaiveDate;
use voxsign_form::{normalize_for_step, validate, FieldError, ValidationContext};
use voxsign_types::{FormState, StepId};

fn context(form: &FormState) -> ValidationContext<'_> {
    ValidationContext::from_form(form).with_today(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())
}

#[test]
fn spoken_answers_normalize_into_valid_values() {
    let form = FormState::default();
    let ctx = context(&form);

    let cases = [
        (StepId::Name, "my name is john smith", "John Smith"),
        (StepId::Username, "my username should be John Doe!", "john_doe"),
        (StepId::Email, "v x r 10 at hotmail dot com", "vxr10@hotmail.com"),
        (StepId::City, "I live in riyadh", "Riyadh"),
    ];

    for (step, spoken, expected) in cases {
        let value = normalize_for_step(step, spoken);
        assert_eq!(value, expected, "normalizing {step}");
        assert_eq!(validate(step, &value, &ctx), Ok(()), "validating {step}");
    }
}

#[test]
fn garbage_transcripts_are_rejected_not_panicking() {
    let form = FormState::default();
    let ctx = context(&form);

    let name = normalize_for_step(StepId::Name, "my name is");
    assert_eq!(validate(StepId::Name, &name, &ctx), Err(FieldError::Required));

    let name = normalize_for_step(StepId::Name, "1234");
    assert_eq!(validate(StepId::Name, &name, &ctx), Err(FieldError::NameInvalid));

    let username = normalize_for_step(StepId::Username, "اسم المستخدم علي");
    assert_eq!(validate(StepId::Username, &username, &ctx), Err(FieldError::Required));

    let email = normalize_for_step(StepId::Email, "no idea");
    assert_eq!(validate(StepId::Email, &email, &ctx), Err(FieldError::EmailInvalid));
}

#[test]
fn terms_and_passwords_use_context() {
    let form = FormState {
        password: "correct horse".to_string(),
        ..Default::default()
    };
    let ctx = context(&form);

    assert_eq!(
        validate(StepId::Password, "short", &ctx),
        Err(FieldError::PasswordTooShort { min: 8 })
    );
    assert_eq!(validate(StepId::ConfirmPassword, "correct horse", &ctx), Ok(()));
    assert_eq!(validate(StepId::Terms, "", &ctx), Err(FieldError::TermsNotAccepted));
    assert_eq!(validate(StepId::Terms, "", &ctx.clone().with_terms(true)), Ok(()));
}
