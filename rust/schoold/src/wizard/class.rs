use std::collections::BTreeMap;

use serde_json::{json, Value};

use super::{StepIssue, WizardDefinition, WizardKind};
use crate::api::paths::CREATE_CLASS;
use crate::api::types::{CreateClassRequest, CreateClassResponse};
use crate::form::{Field, FieldGroup, Validator};

pub const STORE_KEY: &str = "classWizardData";

pub const STEP_LABELS: &[&str] = &["Class Info", "Staff", "Schedule", "Review"];

pub const DEFAULT_DAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

// Placeholder catalogues until the staff and subject endpoints exist.
pub const TEACHERS: &[&str] = &["Ms. Ayesha", "Mr. Hamid", "Ms. Fatima", "Mr. Ali"];
pub const SUBJECTS: &[&str] = &[
    "Mathematics",
    "English",
    "Physics",
    "Chemistry",
    "Biology",
    "History",
    "Geography",
];

const SCHEDULE_STEP: usize = 2;

/// Class creation: Info → Staff → Schedule → Review.
///
/// The schedule is one list field per configured day under
/// `step3.schedule`; every day must carry at least one subject before the
/// schedule step counts as complete.
#[derive(Debug, Clone)]
pub struct ClassWizard {
    days: Vec<String>,
}

impl ClassWizard {
    pub fn new(days: Vec<String>) -> Self {
        let days = if days.is_empty() {
            DEFAULT_DAYS.iter().map(|d| d.to_string()).collect()
        } else {
            days
        };
        Self { days }
    }

    fn schedule<'a>(&self, groups: &'a [FieldGroup]) -> Option<&'a FieldGroup> {
        groups.get(SCHEDULE_STEP)?.subgroup("schedule")
    }
}

fn whole_number() -> Field {
    Field::text()
        .required()
        .with(Validator::Integer)
        .with(Validator::Min(1.0))
}

impl Default for ClassWizard {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl WizardDefinition for ClassWizard {
    type Payload = CreateClassRequest;
    type Response = CreateClassResponse;

    fn kind(&self) -> WizardKind {
        WizardKind::Class
    }

    fn store_key(&self) -> &'static str {
        STORE_KEY
    }

    fn endpoint(&self) -> &'static str {
        CREATE_CLASS
    }

    fn step_labels(&self) -> &'static [&'static str] {
        STEP_LABELS
    }

    fn build_groups(&self) -> Vec<FieldGroup> {
        let info = FieldGroup::new("step1")
            .field("grade", whole_number())
            .field("section", Field::text().required())
            .field("room", whole_number());

        let staff = FieldGroup::new("step2").field("classTeacher", Field::text().required());

        let schedule = self
            .days
            .iter()
            .fold(FieldGroup::new("schedule"), |g, day| g.field(day.clone(), Field::list()));
        let lessons = FieldGroup::new("step3")
            .field("subjects", Field::list().with(Validator::MinItems(1)))
            .group(schedule);

        vec![info, staff, lessons, FieldGroup::new("review")]
    }

    fn step_issues(&self, step: usize, groups: &[FieldGroup]) -> Vec<StepIssue> {
        if step != SCHEDULE_STEP {
            return Vec::new();
        }
        let Some(schedule) = self.schedule(groups) else {
            return Vec::new();
        };
        self.days
            .iter()
            .filter(|day| schedule.list_of(day).is_empty())
            .map(|day| StepIssue {
                path: format!("step3.schedule.{day}"),
                code: "dayEmpty",
                message: format!("{day} has no subjects scheduled"),
            })
            .collect()
    }

    fn assemble(&self, groups: &[FieldGroup]) -> Result<CreateClassRequest, String> {
        let [info, staff, lessons, ..] = groups else {
            return Err("class wizard is missing steps".into());
        };
        let grade = info.integer_of("grade").ok_or("grade must be a whole number")?;
        let room = info.integer_of("room").ok_or("room must be a whole number")?;

        let mut weekly_schedule = BTreeMap::new();
        for day in &self.days {
            weekly_schedule.insert(day.clone(), lessons.list_of(&format!("schedule.{day}")));
        }

        Ok(CreateClassRequest {
            grade,
            section: info.text_of("section"),
            room,
            teacher: staff.text_of("classTeacher"),
            subjects: lessons.list_of("subjects"),
            weekly_schedule,
        })
    }

    fn confirmed(&self, _response: &CreateClassResponse) -> bool {
        // Decoding already required a `data` object.
        true
    }

    fn success_message(&self) -> &'static str {
        "Class added successfully"
    }

    fn options(&self) -> Value {
        json!({
            "teachers": TEACHERS,
            "subjects": SUBJECTS,
            "days": self.days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::form::FieldValue;
    use crate::store::{MemoryStore, StoreError, TransientStore};
    use crate::wizard::{
        JumpOutcome, Restore, SubmitOutcome, SubmitRejection, Wizard, WizardOps, DEFAULT_DEBOUNCE,
    };
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn wizard() -> Wizard<ClassWizard> {
        Wizard::new(ClassWizard::default(), DEFAULT_DEBOUNCE)
    }

    fn fill_info(w: &mut Wizard<ClassWizard>) {
        w.set_field("step1.grade", &json!(5)).unwrap();
        w.set_field("step1.section", &json!("A")).unwrap();
        w.set_field("step1.room", &json!(12)).unwrap();
    }

    fn fill_schedule(w: &mut Wizard<ClassWizard>, skip: Option<&str>) {
        w.toggle("step3.subjects", "English").unwrap();
        w.toggle("step3.subjects", "Physics").unwrap();
        for day in DEFAULT_DAYS {
            if Some(*day) == skip {
                continue;
            }
            w.toggle(&format!("step3.schedule.{day}"), "English").unwrap();
        }
    }

    fn complete(w: &mut Wizard<ClassWizard>, store: &mut dyn TransientStore) {
        fill_info(w);
        assert!(w.advance(store));
        w.set_field("step2.classTeacher", &json!("Ms. Ayesha")).unwrap();
        assert!(w.advance(store));
        fill_schedule(w, None);
        assert!(w.advance(store));
        assert_eq!(w.current_step(), 4);
    }

    struct BrokenStore;

    impl TransientStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("storage disabled")))
        }
        fn write(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("storage disabled")))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("storage disabled")))
        }
    }

    #[test]
    fn valid_class_info_advances_to_staff() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        assert_eq!(w.current_step(), 1);
        fill_info(&mut w);
        assert!(w.can_advance(1));
        assert!(w.advance(&mut store));
        assert_eq!(w.current_step(), 2);
        assert!(store.read(STORE_KEY).unwrap().is_some());
    }

    #[test]
    fn advance_with_missing_field_marks_group_touched_and_stays() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        w.set_field("step1.grade", &json!(5)).unwrap();
        assert!(!w.can_advance(1));
        assert!(!w.advance(&mut store));
        assert_eq!(w.current_step(), 1);
        let view = w.view();
        let paths: Vec<&str> = view["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].as_str().unwrap())
            .collect();
        assert!(paths.contains(&"step1.section"));
        assert!(paths.contains(&"step1.room"));
    }

    #[test]
    fn room_below_one_blocks_step_one() {
        let mut w = wizard();
        fill_info(&mut w);
        w.set_field("step1.room", &json!(0)).unwrap();
        assert!(!w.can_advance(1));
    }

    #[test]
    fn fractional_grade_blocks_step_one_with_an_error() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        fill_info(&mut w);
        w.set_field("step1.grade", &json!("5.7")).unwrap();
        assert!(!w.can_advance(1));
        assert!(!w.advance(&mut store));

        let view = w.view();
        let codes: Vec<(&str, &str)> = view["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| (e["path"].as_str().unwrap(), e["code"].as_str().unwrap()))
            .collect();
        assert_eq!(codes, vec![("step1.grade", "integer")]);

        w.set_field("step1.grade", &json!(5)).unwrap();
        w.set_field("step1.room", &json!(12.9)).unwrap();
        assert!(!w.can_advance(1));
    }

    #[test]
    fn submitted_payload_keeps_whole_numbers() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        complete(&mut w, &mut store);
        w.set_field("step1.room", &json!("12")).unwrap();
        let prepared = w.begin_submit().unwrap();
        assert_eq!(prepared.payload["grade"], json!(5));
        assert_eq!(prepared.payload["room"], json!(12));
    }

    #[test]
    fn schedule_with_empty_day_cannot_advance() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        fill_info(&mut w);
        w.advance(&mut store);
        w.set_field("step2.classTeacher", &json!("Mr. Ali")).unwrap();
        w.advance(&mut store);
        fill_schedule(&mut w, Some("tuesday"));

        assert!(!w.can_advance(3));
        assert!(!w.advance(&mut store));
        assert_eq!(w.current_step(), 3);
        assert_eq!(
            w.begin_submit().unwrap_err(),
            SubmitRejection::NotAtFinalStep { current: 3, last: 4 }
        );
        let issues = w.definition().step_issues(2, w.groups());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "step3.schedule.tuesday");
    }

    #[test]
    fn list_fields_refuse_scalars_when_set_or_restored() {
        let mut w = wizard();
        assert!(w.set_field("step3.subjects", &json!("English")).is_err());
        assert!(w.set_field("step1.section", &json!(["A"])).is_err());

        let mut store = MemoryStore::default();
        store
            .write(
                STORE_KEY,
                &json!({
                    "formValue": { "step3": { "subjects": "English" } },
                    "currentStep": 3,
                    "timestamp": null
                })
                .to_string(),
            )
            .unwrap();
        let mut w = wizard();
        w.restore(&store);
        assert_eq!(w.value_of("step3.subjects"), Some(&FieldValue::empty_list()));
        assert!(w.toggle("step3.subjects", "English").unwrap());
    }

    #[test]
    fn toggling_twice_leaves_selection_unchanged() {
        let mut w = wizard();
        w.toggle("step3.subjects", "History").unwrap();
        let before = w.value_of("step3.subjects").cloned();
        assert!(w.toggle("step3.subjects", "Biology").unwrap());
        assert!(!w.toggle("step3.subjects", "Biology").unwrap());
        assert_eq!(w.value_of("step3.subjects").cloned(), before);
    }

    #[test]
    fn toggle_rejects_scalar_fields_and_unknown_paths() {
        let mut w = wizard();
        w.set_field("step1.section", &json!("A")).unwrap();
        assert!(w.toggle("step1.section", "B").is_err());
        assert!(w.toggle("step3.schedule.sunday", "English").is_err());
        assert!(w.set_field("nope", &json!(1)).is_err());
    }

    #[test]
    fn jump_back_is_free_and_forward_is_gated() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        assert_eq!(w.jump_to(3, &mut store).unwrap(), JumpOutcome::Blocked { step: 1 });
        assert_eq!(w.current_step(), 1);
        // Blocked jumps surface errors for every group.
        assert!(!w.view()["errors"].as_array().unwrap().is_empty());

        fill_info(&mut w);
        assert_eq!(w.jump_to(3, &mut store).unwrap(), JumpOutcome::Blocked { step: 2 });
        w.set_field("step2.classTeacher", &json!("Mr. Hamid")).unwrap();
        assert_eq!(w.jump_to(3, &mut store).unwrap(), JumpOutcome::Moved);
        assert_eq!(w.current_step(), 3);
        assert_eq!(w.jump_to(4, &mut store).unwrap(), JumpOutcome::Blocked { step: 3 });

        // Going back never re-validates.
        w.set_field("step1.grade", &json!(null)).unwrap();
        assert_eq!(w.jump_to(1, &mut store).unwrap(), JumpOutcome::Moved);
        assert_eq!(w.current_step(), 1);
        assert!(w.jump_to(5, &mut store).is_err());
        assert!(w.jump_to(0, &mut store).is_err());
    }

    #[test]
    fn retreat_is_bounded_by_first_step() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        assert!(!w.retreat(&mut store));
        fill_info(&mut w);
        w.advance(&mut store);
        assert!(w.retreat(&mut store));
        assert_eq!(w.current_step(), 1);
    }

    #[test]
    fn persist_then_restore_reproduces_values_and_step() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        complete(&mut w, &mut store);
        w.jump_to(3, &mut store).unwrap();
        w.persist(&mut store);

        let restored = Wizard::open(ClassWizard::default(), &store, DEFAULT_DEBOUNCE);
        assert_eq!(restored.current_step(), 3);
        assert_eq!(restored.view()["values"], w.view()["values"]);
    }

    #[test]
    fn restore_opens_at_saved_step_with_prefilled_fields() {
        let mut store = MemoryStore::default();
        store
            .write(
                STORE_KEY,
                &json!({
                    "formValue": { "step1": { "grade": "7", "section": "B", "room": 3 } },
                    "currentStep": 2,
                    "timestamp": "2025-01-01T10:00:00Z"
                })
                .to_string(),
            )
            .unwrap();
        let mut w = wizard();
        assert_eq!(w.restore(&store), Restore::Restored { step: 2 });
        assert_eq!(w.current_step(), 2);
        assert_eq!(w.value_of("step1.section").unwrap().text(), "B");
        assert_eq!(w.value_of("step1.room").unwrap().text(), "3");
    }

    #[test]
    fn restore_clamps_step_and_survives_garbage() {
        let mut store = MemoryStore::default();
        store
            .write(STORE_KEY, r#"{"formValue":{},"currentStep":9}"#)
            .unwrap();
        assert_eq!(wizard().restore(&store), Restore::Restored { step: 4 });

        store.write(STORE_KEY, "not json").unwrap();
        let mut w = wizard();
        assert_eq!(w.restore(&store), Restore::Fresh);
        assert_eq!(w.current_step(), 1);

        assert_eq!(wizard().restore(&BrokenStore), Restore::Fresh);
    }

    #[test]
    fn store_failures_never_block_navigation() {
        let mut w = Wizard::open(ClassWizard::default(), &BrokenStore, DEFAULT_DEBOUNCE);
        let mut store = BrokenStore;
        fill_info(&mut w);
        assert!(w.advance(&mut store));
        assert_eq!(w.current_step(), 2);
        assert!(w.last_saved_at().is_none());
    }

    #[test]
    fn field_edits_are_debounced() {
        let mut store = MemoryStore::default();
        let mut w = Wizard::new(ClassWizard::default(), Duration::from_millis(500));
        w.set_field("step1.section", &json!("C")).unwrap();
        let deadline = w.autosave_deadline().expect("pending autosave");
        assert!(!w.flush_due(&mut store, deadline - Duration::from_millis(1)));
        assert!(store.read(STORE_KEY).unwrap().is_none());
        assert!(w.flush_due(&mut store, deadline));
        assert!(store.read(STORE_KEY).unwrap().is_some());
        assert!(w.autosave_deadline().is_none());
        assert!(!w.flush_due(&mut store, Instant::now() + Duration::from_secs(1)));
    }

    #[test]
    fn successful_submit_clears_store_and_resets() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        complete(&mut w, &mut store);

        let sub = w.begin_submit().expect("submission");
        assert_eq!(sub.endpoint, "/class/create");
        assert_eq!(sub.payload["grade"], json!(5));
        assert_eq!(sub.payload["room"], json!(12));
        assert_eq!(sub.payload["teacher"], json!("Ms. Ayesha"));
        assert_eq!(sub.payload["weeklySchedule"]["saturday"], json!(["English"]));
        assert_eq!(w.begin_submit().unwrap_err(), SubmitRejection::Pending);

        let outcome = w.finish_submit(sub.id, Ok(json!({ "data": { "id": 1 } })), &mut store);
        assert_eq!(
            outcome,
            SubmitOutcome::Succeeded {
                message: "Class added successfully"
            }
        );
        assert_eq!(store.read(STORE_KEY).unwrap(), None);
        assert_eq!(w.current_step(), 1);
        assert!(w.value_of("step1.grade").unwrap().is_empty());
        assert!(!w.is_submitting());
    }

    #[test]
    fn failed_submit_keeps_values_and_surfaces_message() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        complete(&mut w, &mut store);
        let sub = w.begin_submit().unwrap();
        let err = ApiError::Rejected {
            status: 409,
            messages: vec!["Room already assigned".into()],
        };
        let outcome = w.finish_submit(sub.id, Err(err), &mut store);
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                messages: vec!["Room already assigned".into()]
            }
        );
        assert_eq!(w.current_step(), 4);
        assert_eq!(w.value_of("step1.section").unwrap().text(), "A");
        assert!(store.read(STORE_KEY).unwrap().is_some());
        // Retry is allowed once the failure has been applied.
        assert!(w.begin_submit().is_ok());
    }

    #[test]
    fn malformed_success_body_counts_as_failure() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        complete(&mut w, &mut store);
        let sub = w.begin_submit().unwrap();
        let outcome = w.finish_submit(sub.id, Ok(json!({ "message": "ok" })), &mut store);
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
        assert_eq!(w.current_step(), 4);
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        complete(&mut w, &mut store);
        let sub = w.begin_submit().unwrap();
        let other = uuid::Uuid::new_v4();
        assert_eq!(
            w.finish_submit(other, Ok(json!({ "data": {} })), &mut store),
            SubmitOutcome::Stale
        );
        assert!(w.is_submitting());
        assert!(matches!(
            w.finish_submit(sub.id, Ok(json!({ "data": {} })), &mut store),
            SubmitOutcome::Succeeded { .. }
        ));
    }

    #[test]
    fn invalid_submit_returns_to_first_step_without_clearing_store() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        complete(&mut w, &mut store);
        w.set_field("step1.section", &json!("")).unwrap();
        assert_eq!(w.begin_submit().unwrap_err(), SubmitRejection::Invalid { step: 1 });
        assert_eq!(w.current_step(), 1);
        assert!(store.read(STORE_KEY).unwrap().is_some());
        assert!(!w.is_submitting());
    }

    #[test]
    fn reset_restores_every_configured_day() {
        let mut store = MemoryStore::default();
        let mut w = wizard();
        complete(&mut w, &mut store);
        w.reset(&mut store);
        let values = w.view()["values"].clone();
        for day in DEFAULT_DAYS {
            assert_eq!(values["step3"]["schedule"][day], json!([]));
        }
        assert_eq!(store.read(STORE_KEY).unwrap(), None);
    }

    #[test]
    fn configured_days_drive_the_schedule() {
        let days = vec!["monday".to_string(), "friday".to_string()];
        let mut w = Wizard::new(ClassWizard::new(days), DEFAULT_DEBOUNCE);
        w.toggle("step3.subjects", "English").unwrap();
        w.toggle("step3.schedule.monday", "English").unwrap();
        w.toggle("step3.schedule.friday", "English").unwrap();
        assert!(w.can_advance(3));
        assert!(w.toggle("step3.schedule.saturday", "English").is_err());
    }
}
