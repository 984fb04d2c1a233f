use chrono::NaiveDate;
use serde_json::{json, Value};

use super::{StepIssue, WizardDefinition, WizardKind};
use crate::api::paths::CREATE_TEACHER;
use crate::api::types::{
    CreateTeacherRequest, CreateTeacherResponse, PersonalInfo, ProfessionalInfo, TeachingClass,
};
use crate::form::{Field, FieldGroup, PatternKind, Validator};

pub const STORE_KEY: &str = "teacherWizardData";

pub const STEP_LABELS: &[&str] = &["Personal Info", "Professional Info", "Teaching Classes"];

pub const SECTIONS: &[&str] = &["R", "G", "B"];

const MAX_GRADE: i64 = 12;
const MAX_EXPERIENCE: i64 = 30;
const DATE_FORMAT: &str = "%Y-%m-%d";

const PROFESSIONAL_STEP: usize = 1;
const CLASSES_STEP: usize = 2;
const CLASSES_FIELD: &str = "classes.teachingClasses";

#[derive(Debug, Clone, Copy, Default)]
pub struct TeacherWizard;

/// Parses a `"<grade>-<section>"` label.
pub fn parse_teaching_class(label: &str) -> Result<TeachingClass, String> {
    let (grade, section) = label
        .split_once('-')
        .ok_or_else(|| format!("expected <grade>-<section>, got {label:?}"))?;
    let grade: i64 = grade
        .trim()
        .parse()
        .map_err(|_| format!("grade {grade:?} is not a number"))?;
    if !(1..=MAX_GRADE).contains(&grade) {
        return Err(format!("grade must be between 1 and {MAX_GRADE}"));
    }
    let section = section.trim().to_uppercase();
    if !SECTIONS.contains(&section.as_str()) {
        return Err(format!(
            "section must be one of {}, got {section:?}",
            SECTIONS.join(", ")
        ));
    }
    Ok(TeachingClass { grade, section })
}

impl WizardDefinition for TeacherWizard {
    type Payload = CreateTeacherRequest;
    type Response = CreateTeacherResponse;

    fn kind(&self) -> WizardKind {
        WizardKind::Teacher
    }

    fn store_key(&self) -> &'static str {
        STORE_KEY
    }

    fn endpoint(&self) -> &'static str {
        CREATE_TEACHER
    }

    fn step_labels(&self) -> &'static [&'static str] {
        STEP_LABELS
    }

    fn build_groups(&self) -> Vec<FieldGroup> {
        let personal = FieldGroup::new("personal")
            .field("title", Field::text().required())
            .field("fullName", Field::text().required().with(Validator::MinLength(2)))
            .field(
                "phone",
                Field::text()
                    .required()
                    .with(Validator::Pattern(PatternKind::Phone)),
            )
            .field(
                "email",
                Field::text()
                    .required()
                    .with(Validator::Pattern(PatternKind::Email)),
            )
            .field("address", Field::text().required());

        let professional = FieldGroup::new("professional")
            .field("subject", Field::text().required())
            .field("department", Field::text().required())
            .field("qualificationDegree", Field::text().required())
            .field("qualificationSubject", Field::text().required())
            .field(
                "experience",
                Field::text()
                    .required()
                    .with(Validator::Integer)
                    .with(Validator::Min(1.0))
                    .with(Validator::Max(MAX_EXPERIENCE as f64)),
            )
            .field("joiningDate", Field::text().required());

        let classes = FieldGroup::new("classes").field("teachingClasses", Field::list());

        vec![personal, professional, classes]
    }

    fn step_issues(&self, step: usize, groups: &[FieldGroup]) -> Vec<StepIssue> {
        let Some(group) = groups.get(step) else {
            return Vec::new();
        };
        match step {
            PROFESSIONAL_STEP => {
                let raw = group.text_of("joiningDate");
                if raw.is_empty() || NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).is_ok() {
                    return Vec::new();
                }
                vec![StepIssue {
                    path: "professional.joiningDate".into(),
                    code: "date",
                    message: "joining date must be YYYY-MM-DD".into(),
                }]
            }
            CLASSES_STEP if group.list_of("teachingClasses").is_empty() => vec![StepIssue {
                path: CLASSES_FIELD.into(),
                code: "noClasses",
                message: "add at least one teaching class".into(),
            }],
            _ => Vec::new(),
        }
    }

    fn normalize_item(&self, path: &str, item: &str) -> Result<String, String> {
        if path != CLASSES_FIELD {
            let item = item.trim();
            if item.is_empty() {
                return Err("item must not be empty".into());
            }
            return Ok(item.to_string());
        }
        let class = parse_teaching_class(item)?;
        Ok(format!("{}-{}", class.grade, class.section))
    }

    fn assemble(&self, groups: &[FieldGroup]) -> Result<CreateTeacherRequest, String> {
        let [personal, professional, classes] = groups else {
            return Err("teacher wizard is missing steps".into());
        };
        let experience = professional
            .integer_of("experience")
            .ok_or("experience must be a whole number")?;
        let teaching_classes = classes
            .list_of("teachingClasses")
            .iter()
            .map(|label| parse_teaching_class(label))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CreateTeacherRequest {
            personal_info: PersonalInfo {
                title: personal.text_of("title"),
                full_name: personal.text_of("fullName"),
                phone: personal.text_of("phone"),
                email: personal.text_of("email"),
                address: personal.text_of("address"),
            },
            professional_info: ProfessionalInfo {
                subject: professional.text_of("subject"),
                department: professional.text_of("department"),
                qualification_degree: professional.text_of("qualificationDegree"),
                qualification_subject: professional.text_of("qualificationSubject"),
                experience,
                joining_date: professional.text_of("joiningDate").trim().to_string(),
            },
            teaching_classes,
        })
    }

    fn confirmed(&self, response: &CreateTeacherResponse) -> bool {
        response.success
    }

    fn success_message(&self) -> &'static str {
        "Teacher has been added successfully."
    }

    fn options(&self) -> Value {
        json!({
            "grades": (1..=MAX_GRADE).collect::<Vec<_>>(),
            "sections": SECTIONS,
            "experienceYears": (1..=MAX_EXPERIENCE).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GENERIC_FAILURE;
    use crate::form::FieldValue;
    use crate::store::{MemoryStore, TransientStore};
    use crate::wizard::{SubmitOutcome, Wizard, WizardOps, DEFAULT_DEBOUNCE};

    fn wizard() -> Wizard<TeacherWizard> {
        Wizard::new(TeacherWizard, DEFAULT_DEBOUNCE)
    }

    fn fill_personal(w: &mut Wizard<TeacherWizard>) {
        for (path, value) in [
            ("personal.title", json!("Ms.")),
            ("personal.fullName", json!("Ayesha Khan")),
            ("personal.phone", json!("+92 300 1234567")),
            ("personal.email", json!("ayesha@school.edu")),
            ("personal.address", json!("12 Park Road")),
        ] {
            w.set_field(path, &value).unwrap();
        }
    }

    fn fill_professional(w: &mut Wizard<TeacherWizard>) {
        for (path, value) in [
            ("professional.subject", json!("Physics")),
            ("professional.department", json!("Science")),
            ("professional.qualificationDegree", json!("MSc")),
            ("professional.qualificationSubject", json!("Physics")),
            ("professional.experience", json!("7")),
            ("professional.joiningDate", json!("2021-08-15")),
        ] {
            w.set_field(path, &value).unwrap();
        }
    }

    #[test]
    fn teaching_class_labels_are_parsed_and_bounded() {
        assert_eq!(
            parse_teaching_class("5-G").unwrap(),
            TeachingClass {
                grade: 5,
                section: "G".into()
            }
        );
        assert!(parse_teaching_class("13-G").is_err());
        assert!(parse_teaching_class("0-G").is_err());
        assert!(parse_teaching_class("5-").is_err());
        assert!(parse_teaching_class("5G").is_err());
        assert!(parse_teaching_class("5-Zebra").is_err());
        assert!(parse_teaching_class("5-Y").is_err());
        assert_eq!(parse_teaching_class(" 7 - b ").unwrap().section, "B");
    }

    #[test]
    fn toggle_rejects_sections_outside_the_offered_list() {
        let mut w = wizard();
        assert!(w.toggle(CLASSES_FIELD, "5-Zebra").is_err());
        assert_eq!(w.value_of(CLASSES_FIELD), Some(&FieldValue::empty_list()));
        assert!(w.toggle(CLASSES_FIELD, "5-r").unwrap());
        assert_eq!(
            w.value_of(CLASSES_FIELD),
            Some(&FieldValue::List(vec!["5-R".into()]))
        );
    }

    #[test]
    fn fractional_experience_blocks_professional_step() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        fill_personal(&mut w);
        assert!(w.advance(&mut store));
        fill_professional(&mut w);
        w.set_field("professional.experience", &json!(7.5)).unwrap();
        assert!(!w.advance(&mut store));
        assert_eq!(w.current_step(), 2);
    }

    #[test]
    fn bad_phone_blocks_personal_step() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        fill_personal(&mut w);
        w.set_field("personal.phone", &json!("12345")).unwrap();
        assert!(!w.advance(&mut store));
        assert_eq!(w.current_step(), 1);
        w.set_field("personal.phone", &json!("0300-1234567")).unwrap();
        assert!(w.advance(&mut store));
    }

    #[test]
    fn joining_date_must_be_a_calendar_date() {
        let mut w = wizard();
        fill_professional(&mut w);
        assert!(w.can_advance(2));
        w.set_field("professional.joiningDate", &json!("2021-02-30")).unwrap();
        assert!(!w.can_advance(2));
        w.set_field("professional.experience", &json!(31)).unwrap();
        w.set_field("professional.joiningDate", &json!("2021-02-28")).unwrap();
        assert!(!w.can_advance(2));
    }

    #[test]
    fn teaching_classes_toggle_in_canonical_form() {
        let mut w = wizard();
        assert!(!w.can_advance(3));
        assert!(w.toggle(CLASSES_FIELD, " 5 - G ").unwrap());
        assert!(!w.toggle(CLASSES_FIELD, "5-G").unwrap());
        assert!(w.toggle(CLASSES_FIELD, "14-R").is_err());
        w.toggle(CLASSES_FIELD, "9-B").unwrap();
        assert!(w.can_advance(3));
        assert_eq!(w.value_of(CLASSES_FIELD).unwrap().as_list(), ["9-B"]);
    }

    #[test]
    fn payload_nests_personal_and_professional_info() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        fill_personal(&mut w);
        assert!(w.advance(&mut store));
        fill_professional(&mut w);
        assert!(w.advance(&mut store));
        w.toggle(CLASSES_FIELD, "5-G").unwrap();

        let sub = w.begin_submit().unwrap();
        assert_eq!(sub.endpoint, "/teacher/create");
        assert_eq!(sub.payload["personalInfo"]["fullName"], json!("Ayesha Khan"));
        assert_eq!(sub.payload["professionalInfo"]["experience"], json!(7));
        assert_eq!(
            sub.payload["teachingClasses"],
            json!([{ "grade": 5, "section": "G" }])
        );

        // `success: false` is not a confirmation.
        let outcome = w.finish_submit(sub.id, Ok(json!({ "success": false })), &mut store);
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                messages: vec![GENERIC_FAILURE.to_string()]
            }
        );
        assert!(store.read(STORE_KEY).unwrap().is_some());

        let sub = w.begin_submit().unwrap();
        let outcome = w.finish_submit(sub.id, Ok(json!({ "success": true })), &mut store);
        assert_eq!(
            outcome,
            SubmitOutcome::Succeeded {
                message: "Teacher has been added successfully."
            }
        );
        assert_eq!(store.read(STORE_KEY).unwrap(), None);
        assert_eq!(w.current_step(), 1);
    }
}
