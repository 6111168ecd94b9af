//! The interview script: step order, prompts, remarks and fixed messages.

use voxsign_types::{Locale, Localized, StepDefinition, StepId};

/// Index of the greeting step.
pub const GREETING_INDEX: usize = 0;
/// Index of the first step that takes an answer.
pub const FIRST_QUESTION_INDEX: usize = 1;

/// The ordered signup interview.
pub static STEPS: [StepDefinition; 12] = [
    StepDefinition::new(StepId::Greeting, true, false, Localized::EMPTY),
    StepDefinition::new(
        StepId::Name,
        true,
        true,
        Localized::new("What is your full name?", "ما اسمك الكامل؟"),
    ),
    StepDefinition::new(
        StepId::Username,
        true,
        true,
        Localized::new(
            "Please choose a username. You can spell it letter by letter.",
            "من فضلك اختر اسم مستخدم. يمكنك تهجئته حرفًا حرفًا.",
        ),
    ),
    StepDefinition::new(
        StepId::Email,
        true,
        true,
        Localized::new("What is your email address?", "ما هو بريدك الإلكتروني؟"),
    ),
    StepDefinition::new(
        StepId::Password,
        true,
        false,
        Localized::new(
            "Now type a password with at least eight characters.",
            "الآن اكتب كلمة مرور من ثمانية أحرف على الأقل.",
        ),
    ),
    StepDefinition::new(
        StepId::ConfirmPassword,
        true,
        false,
        Localized::new(
            "Please type your password again to confirm it.",
            "من فضلك أعد كتابة كلمة المرور للتأكيد.",
        ),
    ),
    StepDefinition::new(
        StepId::Dob,
        false,
        false,
        Localized::new(
            "What is your date of birth? You can skip this step.",
            "ما هو تاريخ ميلادك؟ يمكنك تخطي هذه الخطوة.",
        ),
    ),
    StepDefinition::new(
        StepId::Country,
        false,
        true,
        Localized::new("Which country do you live in?", "في أي دولة تعيش؟"),
    ),
    StepDefinition::new(
        StepId::City,
        false,
        true,
        Localized::new("And which city?", "وفي أي مدينة؟"),
    ),
    StepDefinition::new(
        StepId::Terms,
        true,
        false,
        Localized::new(
            "Please read the terms and conditions and accept them to continue.",
            "من فضلك اقرأ الشروط والأحكام ووافق عليها للمتابعة.",
        ),
    ),
    StepDefinition::new(StepId::Creating, true, false, Localized::EMPTY),
    StepDefinition::new(StepId::Welcome, true, false, Localized::EMPTY),
];

pub const GREETING: Localized = Localized::new(
    "Hi, and welcome to voxsign! I will help you create your account in a few short steps. Press Let's Begin whenever you are ready.",
    "مرحبًا بك في فوكس ساين! سأساعدك في إنشاء حسابك في خطوات قليلة. اضغط على لنبدأ عندما تكون جاهزًا.",
);

pub const WELCOME: Localized = Localized::new(
    "Your account is ready. Welcome aboard!",
    "حسابك جاهز. أهلًا بك معنا!",
);

pub const WEAK_PASSWORD: Localized = Localized::new(
    "That password is too weak. Please choose a stronger one.",
    "كلمة المرور ضعيفة جدًا. من فضلك اختر كلمة مرور أقوى.",
);

pub const ACCOUNT_FAILED: Localized = Localized::new(
    "We could not create your account. Please check your details and try again.",
    "تعذر إنشاء حسابك. من فضلك تحقق من بياناتك وحاول مرة أخرى.",
);

pub const NOTHING_HEARD: Localized = Localized::new(
    "Sorry, I didn't catch that. Please hold the button and try again.",
    "عذرًا، لم أسمع ذلك. اضغط مطولًا على الزر وحاول مرة أخرى.",
);

const NAME_REMARKS: &[Localized] = &[
    Localized::new("Nice to meet you!", "تشرفنا بمعرفتك!"),
    Localized::new("What a lovely name.", "اسم جميل."),
    Localized::new("Great, thank you.", "رائع، شكرًا لك."),
];

const USERNAME_REMARKS: &[Localized] = &[
    Localized::new("Good choice.", "اختيار موفق."),
    Localized::new("That username works.", "اسم المستخدم هذا مناسب."),
    Localized::new("Got it.", "تمام."),
];

const EMAIL_REMARKS: &[Localized] = &[
    Localized::new("Thanks, I've noted your email.", "شكرًا، سجلت بريدك الإلكتروني."),
    Localized::new("Perfect.", "ممتاز."),
    Localized::new("Great, that's saved.", "رائع، تم الحفظ."),
];

const COUNTRY_REMARKS: &[Localized] = &[
    Localized::new("Lovely place.", "مكان جميل."),
    Localized::new("Thanks for sharing.", "شكرًا لمشاركتك."),
    Localized::new("Noted.", "تم التسجيل."),
];

const CITY_REMARKS: &[Localized] = &[
    Localized::new("Sounds great.", "يبدو رائعًا."),
    Localized::new("Thank you.", "شكرًا لك."),
    Localized::new("Almost done.", "اقتربنا من النهاية."),
];

/// Acknowledgement remarks for `step`. Empty for silent steps.
pub fn remarks(step: StepId) -> &'static [Localized] {
    match step {
        StepId::Name => NAME_REMARKS,
        StepId::Username => USERNAME_REMARKS,
        StepId::Email => EMAIL_REMARKS,
        StepId::Country => COUNTRY_REMARKS,
        StepId::City => CITY_REMARKS,
        _ => &[],
    }
}

/// Text spoken when the step at `index` becomes current, if any.
pub fn prompt_text(index: usize, locale: Locale) -> Option<&'static str> {
    let step = STEPS.get(index)?;
    if step.id == StepId::Greeting {
        return Some(GREETING.get(locale));
    }
    step.is_prompted().then(|| step.prompt.get(locale))
}

pub fn index_of(step: StepId) -> usize {
    STEPS.iter().position(|s| s.id == step).unwrap_or(GREETING_INDEX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_follows_step_order() {
        let ids: Vec<StepId> = STEPS.iter().map(|s| s.id).collect();
        assert_eq!(ids, StepId::ALL.to_vec());
    }

    #[test]
    fn only_dob_country_and_city_are_optional() {
        let optional: Vec<StepId> = STEPS.iter().filter(|s| !s.required).map(|s| s.id).collect();
        assert_eq!(optional, vec![StepId::Dob, StepId::Country, StepId::City]);
    }

    #[test]
    fn every_voice_step_has_remarks_in_both_locales() {
        for step in STEPS.iter().filter(|s| s.voice) {
            let set = remarks(step.id);
            assert!(!set.is_empty(), "{} has no remarks", step.id);
            for remark in set {
                assert!(!remark.en.is_empty() && !remark.ar.is_empty());
            }
        }
    }

    #[test]
    fn silent_steps_have_no_remarks() {
        for id in [StepId::Password, StepId::ConfirmPassword, StepId::Terms, StepId::Dob] {
            assert!(remarks(id).is_empty(), "{id} should be silent");
        }
    }

    #[test]
    fn greeting_is_spoken_but_creating_is_not() {
        assert!(prompt_text(GREETING_INDEX, Locale::Ar).is_some());
        assert_eq!(prompt_text(index_of(StepId::Creating), Locale::En), None);
        assert_eq!(prompt_text(index_of(StepId::Welcome), Locale::En), None);
        assert_eq!(prompt_text(99, Locale::En), None);
    }
}
