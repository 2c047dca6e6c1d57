/// A tracked wellbeing statement answered on the four-point agreement scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellbeingQuestion {
    pub key: &'static str,
    pub text: &'static str,
}

pub const LEAVING_CONTEMPLATION_TEXT: &str =
    "I have considered leaving my role in the last twelve months";

pub const DOING_WELL_PROMPT: &str = "What is the school doing well to support staff wellbeing?";
pub const COULD_IMPROVE_PROMPT: &str = "What could the school do to improve staff wellbeing?";

pub const WELLBEING_QUESTIONS: &[WellbeingQuestion] = &[
    WellbeingQuestion {
        key: "valued_member",
        text: "I feel like a valued member of the school community",
    },
    WellbeingQuestion {
        key: "leadership_consideration",
        text: "Leadership consider staff wellbeing when making decisions",
    },
    WellbeingQuestion {
        key: "workload_manageable",
        text: "My workload is manageable",
    },
    WellbeingQuestion {
        key: "work_life_balance",
        text: "I am able to maintain a healthy work-life balance",
    },
    WellbeingQuestion {
        key: "health_and_wellbeing",
        text: "The school supports my physical and mental health",
    },
    WellbeingQuestion {
        key: "leadership_support",
        text: "I feel supported by the senior leadership team",
    },
    WellbeingQuestion {
        key: "professional_development",
        text: "I have access to meaningful professional development",
    },
    WellbeingQuestion {
        key: "behaviour_support",
        text: "I am supported in managing pupil behaviour",
    },
    WellbeingQuestion {
        key: "colleague_support",
        text: "I can rely on my colleagues for support",
    },
    WellbeingQuestion {
        key: "proud_to_work",
        text: "I am proud to work at this school",
    },
];
