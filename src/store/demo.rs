//! Sample data for `DEMO_MODE`. Only used when explicitly enabled; the
//! Postgres path never falls back to it.

use crate::domain::catalogue::WELLBEING_QUESTIONS;
use crate::domain::models::{
    CustomAnswer, CustomQuestion, CustomQuestionKind, LikertLabel, SubscriptionTier,
    SurveyResponse, SurveyStatus, SurveyTemplate,
};
use crate::store::memory::InMemoryStore;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const DEMO_PREMIUM_OWNER: Uuid = Uuid::from_u128(0x5a1e_0000_0000_4000_8000_0000_0000_0001);
pub const DEMO_FREE_OWNER: Uuid = Uuid::from_u128(0x5a1e_0000_0000_4000_8000_0000_0000_0002);

struct SeedSurvey<'a> {
    owner_id: Uuid,
    name: &'a str,
    days_ago: i64,
    emails: &'a str,
    respondents: usize,
    status: SurveyStatus,
}

const DOING_WELL: &[&str] = &[
    "Leadership are visible and approachable",
    "Great team spirit in the department",
    "Flexible PPA arrangements",
    "Wellbeing days are appreciated",
    "",
];

const COULD_IMPROVE: &[&str] = &[
    "Fewer data drops each term",
    "Clearer behaviour policy follow-through",
    "Reduce meeting load after school",
    "More time for marking",
    "",
];

const CONTRACT_OPTIONS: &[&str] = &["Full time", "Part time", "Supply"];

pub fn seed_demo_store(now: DateTime<Utc>) -> InMemoryStore {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut store = InMemoryStore::new();

    store.set_tier(DEMO_PREMIUM_OWNER, SubscriptionTier::Premium);
    store.set_tier(DEMO_FREE_OWNER, SubscriptionTier::Free);

    let seeds = [
        SeedSurvey {
            owner_id: DEMO_PREMIUM_OWNER,
            name: "Autumn staff wellbeing",
            days_ago: 60,
            emails: "head@oakfield.sch.uk, deputy@oakfield.sch.uk, maths@oakfield.sch.uk, \
                     english@oakfield.sch.uk, science@oakfield.sch.uk, art@oakfield.sch.uk, \
                     pe@oakfield.sch.uk, music@oakfield.sch.uk, office@oakfield.sch.uk, \
                     senco@oakfield.sch.uk, ta1@oakfield.sch.uk, ta2@oakfield.sch.uk, \
                     ta3@oakfield.sch.uk, ta4@oakfield.sch.uk, ict@oakfield.sch.uk, \
                     history@oakfield.sch.uk, geography@oakfield.sch.uk, re@oakfield.sch.uk, \
                     dt@oakfield.sch.uk, drama@oakfield.sch.uk, mfl@oakfield.sch.uk, \
                     pastoral@oakfield.sch.uk, site@oakfield.sch.uk, not-an-email",
            respondents: 22,
            status: SurveyStatus::Completed,
        },
        SeedSurvey {
            owner_id: DEMO_PREMIUM_OWNER,
            name: "Spring pulse",
            days_ago: 5,
            emails: "head@oakfield.sch.uk, deputy@oakfield.sch.uk, maths@oakfield.sch.uk",
            respondents: 2,
            status: SurveyStatus::Sent,
        },
        SeedSurvey {
            owner_id: DEMO_PREMIUM_OWNER,
            name: "Summer check-in",
            days_ago: -30,
            emails: "",
            respondents: 0,
            status: SurveyStatus::Scheduled,
        },
        SeedSurvey {
            owner_id: DEMO_FREE_OWNER,
            name: "Staff voice",
            days_ago: 20,
            emails: "office@elmview.sch.uk, head@elmview.sch.uk",
            respondents: 12,
            status: SurveyStatus::Sent,
        },
        SeedSurvey {
            owner_id: Uuid::from_u128(0x5a1e_0000_0000_4000_8000_0000_0000_0003),
            name: "National sample",
            days_ago: 40,
            emails: "",
            respondents: 80,
            status: SurveyStatus::Completed,
        },
    ];

    for seed in seeds {
        let date = now - Duration::days(seed.days_ago);
        let survey = SurveyTemplate {
            id: seeded_id(&mut rng),
            owner_id: seed.owner_id,
            name: seed.name.to_string(),
            date,
            close_date: Some(date + Duration::days(14)),
            emails: (!seed.emails.is_empty()).then(|| seed.emails.to_string()),
            status: seed.status,
        };

        let question = CustomQuestion {
            id: seeded_id(&mut rng),
            survey_id: survey.id,
            text: "What is your contract type?".to_string(),
            kind: CustomQuestionKind::Dropdown,
            options: CONTRACT_OPTIONS.iter().map(|s| s.to_string()).collect(),
        };

        for idx in 0..seed.respondents {
            let submitted_at = date + Duration::hours(rng.gen_range(1..24 * 7));
            let response = random_response(&mut rng, survey.id, submitted_at);
            store.add_custom_answer(CustomAnswer {
                question_id: question.id,
                response_id: response.id,
                answer: CONTRACT_OPTIONS[idx % CONTRACT_OPTIONS.len()].to_string(),
                submitted_at,
            });
            store.add_response(response);
        }

        store.add_custom_question(question);
        store.add_survey(survey);
    }

    store
}

/// Ids come from the seeded rng so every demo run serves the same URLs.
fn seeded_id(rng: &mut StdRng) -> Uuid {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid()
}

fn random_label(rng: &mut StdRng) -> Option<String> {
    // Roughly one in ten rows leaves a question blank.
    if rng.gen_ratio(1, 10) {
        return None;
    }
    let label = LikertLabel::ALL[rng.gen_range(0..LikertLabel::ALL.len())];
    Some(label.as_str().to_string())
}

fn random_text(rng: &mut StdRng, pool: &[&str]) -> Option<String> {
    let text = pool[rng.gen_range(0..pool.len())];
    (!text.is_empty()).then(|| text.to_string())
}

fn random_response(rng: &mut StdRng, survey_id: Uuid, submitted_at: DateTime<Utc>) -> SurveyResponse {
    let likert_answers: BTreeMap<String, Option<String>> = WELLBEING_QUESTIONS
        .iter()
        .map(|q| (q.key.to_string(), random_label(rng)))
        .collect();

    SurveyResponse {
        id: seeded_id(rng),
        survey_id,
        submitted_at,
        recommendation_score: (!rng.gen_ratio(1, 12)).then(|| rng.gen_range(3..=10)),
        leaving_contemplation: random_label(rng),
        likert_answers,
        doing_well: random_text(rng, DOING_WELL),
        could_improve: random_text(rng, COULD_IMPROVE),
    }
}
