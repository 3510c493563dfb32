use gradebook_core::db::open_db_in_memory;
use gradebook_core::{
    Department, EntityKind, MarksLedger, RecordValidationError, RepoError, RosterRepository,
    ServiceError, SqliteMarksRepository, SqliteRosterRepository, Student, Subject, SubjectKind,
};
use rusqlite::Connection;

const STUDENT: &str = "2024CS0001";
const OTHER_STUDENT: &str = "2024CS0002";
const SUBJECT: &str = "1";

type Ledger<'conn> = MarksLedger<SqliteMarksRepository<'conn>, SqliteRosterRepository<'conn>>;

fn seeded_db() -> Connection {
    let conn = open_db_in_memory().unwrap();
    let roster = SqliteRosterRepository::try_new(&conn).unwrap();
    roster
        .insert_department(&Department {
            id: "1".to_string(),
            name: "Computer Science".to_string(),
            code: "CS".to_string(),
        })
        .unwrap();
    roster
        .insert_subject(&Subject {
            id: SUBJECT.to_string(),
            name: "Operating Systems".to_string(),
            code: "CS301".to_string(),
            kind: SubjectKind::Theory,
            department_id: "1".to_string(),
            semester: 3,
            credits: 4,
        })
        .unwrap();
    for (id, name) in [(STUDENT, "Asha"), (OTHER_STUDENT, "Ravi")] {
        roster
            .insert_student(&Student::enrolled(id, name, "student@uni.edu", "1", 3))
            .unwrap();
    }
    conn
}

fn ledger(conn: &Connection) -> Ledger<'_> {
    MarksLedger::new(
        SqliteMarksRepository::try_new(conn).unwrap(),
        SqliteRosterRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn fat_records_with_distinct_numbers_coexist() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    ledger
        .save_internal(STUDENT, SUBJECT, 1, 45.0, vec![8.0, 9.0])
        .unwrap();
    ledger
        .save_internal(STUDENT, SUBJECT, 2, 42.0, vec![7.0, 10.0])
        .unwrap();

    let records = ledger.internal_marks(STUDENT, SUBJECT).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].fat_number, 1);
    assert_eq!(records[0].fat_marks, 45.0);
    assert_eq!(records[0].assignments, vec![8.0, 9.0]);
    assert_eq!(records[1].fat_number, 2);
    assert_eq!(records[1].fat_marks, 42.0);
    assert_eq!(records[1].assignments, vec![7.0, 10.0]);
}

#[test]
fn saving_same_fat_number_replaces_the_whole_record() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    ledger
        .save_internal(STUDENT, SUBJECT, 2, 42.0, vec![7.0, 10.0, 6.0])
        .unwrap();
    ledger
        .save_internal(STUDENT, SUBJECT, 2, 30.0, vec![5.0])
        .unwrap();

    let records = ledger.internal_marks(STUDENT, SUBJECT).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fat_marks, 30.0);
    assert_eq!(records[0].assignments, vec![5.0]);
}

#[test]
fn invalid_internal_marks_are_rejected_without_writes() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    assert!(matches!(
        ledger.save_internal(STUDENT, SUBJECT, 4, 40.0, vec![8.0]),
        Err(ServiceError::Validation(RecordValidationError::OutOfRange {
            field: "fatNumber",
            ..
        }))
    ));
    assert!(matches!(
        ledger.save_internal(STUDENT, SUBJECT, 1, 40.0, vec![]),
        Err(ServiceError::Validation(RecordValidationError::InvalidCount { .. }))
    ));
    assert!(matches!(
        ledger.save_internal(STUDENT, SUBJECT, 1, 140.0, vec![8.0]),
        Err(ServiceError::Validation(_))
    ));
    assert!(ledger.internal_marks(STUDENT, SUBJECT).unwrap().is_empty());
}

#[test]
fn unknown_student_or_subject_is_not_found() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    match ledger.save_internal("2024CS9999", SUBJECT, 1, 40.0, vec![8.0]) {
        Err(ServiceError::NotFound { entity, id }) => {
            assert_eq!(entity, EntityKind::Student);
            assert_eq!(id, "2024CS9999");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(matches!(
        ledger.save_external(STUDENT, "99", 40.0),
        Err(ServiceError::NotFound {
            entity: EntityKind::Subject,
            ..
        })
    ));
    assert!(matches!(
        ledger.submit_external("99"),
        Err(ServiceError::NotFound {
            entity: EntityKind::Subject,
            ..
        })
    ));
}

#[test]
fn unsubmitted_sat_marks_can_be_overwritten() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    ledger.save_external(STUDENT, SUBJECT, 35.0).unwrap();
    ledger.save_external(STUDENT, SUBJECT, 48.0).unwrap();

    let stored = ledger.external_marks(STUDENT, SUBJECT).unwrap().unwrap();
    assert_eq!(stored.marks, 48.0);
    assert!(!stored.is_submitted);
}

#[test]
fn raw_sat_marks_span_zero_to_hundred() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    assert_eq!(ledger.save_external(STUDENT, SUBJECT, 75.0).unwrap().marks, 75.0);
    ledger.save_external(STUDENT, SUBJECT, 100.0).unwrap();
    assert_eq!(
        ledger.external_marks(STUDENT, SUBJECT).unwrap().unwrap().marks,
        100.0
    );

    assert!(matches!(
        ledger.save_external(STUDENT, SUBJECT, 100.5),
        Err(ServiceError::Validation(RecordValidationError::OutOfRange {
            field: "marks",
            ..
        }))
    ));
    assert!(matches!(
        ledger.save_external(STUDENT, SUBJECT, -1.0),
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(
        ledger.external_marks(STUDENT, SUBJECT).unwrap().unwrap().marks,
        100.0
    );
}

#[test]
fn submitted_sat_marks_are_locked() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    ledger.save_external(STUDENT, SUBJECT, 52.0).unwrap();
    assert_eq!(ledger.submit_external(SUBJECT).unwrap(), 1);

    match ledger.save_external(STUDENT, SUBJECT, 10.0) {
        Err(ServiceError::AlreadySubmitted {
            student_id,
            subject_id,
        }) => {
            assert_eq!(student_id, STUDENT);
            assert_eq!(subject_id, SUBJECT);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let stored = ledger.external_marks(STUDENT, SUBJECT).unwrap().unwrap();
    assert_eq!(stored.marks, 52.0);
    assert!(stored.is_submitted);
}

#[test]
fn submit_is_subject_wide_and_idempotent() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    ledger.save_external(STUDENT, SUBJECT, 52.0).unwrap();
    ledger.save_external(OTHER_STUDENT, SUBJECT, 44.5).unwrap();

    assert_eq!(ledger.submit_external(SUBJECT).unwrap(), 2);
    let after_first = ledger.subject_external_marks(SUBJECT).unwrap();
    assert_eq!(ledger.submit_external(SUBJECT).unwrap(), 0);
    let after_second = ledger.subject_external_marks(SUBJECT).unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(after_first.len(), 2);
    assert_eq!(after_first[0].student_id, STUDENT);
    assert_eq!(after_first[1].student_id, OTHER_STUDENT);
    assert!(after_first.iter().all(|record| record.is_submitted));
}

#[test]
fn submit_with_no_sat_records_locks_nothing() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    assert_eq!(ledger.submit_external(SUBJECT).unwrap(), 0);
    ledger.save_external(STUDENT, SUBJECT, 20.0).unwrap();
    assert!(!ledger.external_marks(STUDENT, SUBJECT).unwrap().unwrap().is_submitted);
}

#[test]
fn internal_marks_stay_editable_after_submission() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    ledger.save_external(STUDENT, SUBJECT, 52.0).unwrap();
    ledger.submit_external(SUBJECT).unwrap();

    ledger
        .save_internal(STUDENT, SUBJECT, 3, 39.0, vec![9.0])
        .unwrap();
    assert_eq!(ledger.internal_marks(STUDENT, SUBJECT).unwrap().len(), 1);
}

#[test]
fn corrupt_stored_rows_surface_as_persistence_errors() {
    let conn = seeded_db();
    let ledger = ledger(&conn);

    ledger.save_external(STUDENT, SUBJECT, 52.0).unwrap();
    conn.execute(
        "UPDATE sat_marks SET marks = 250.0 WHERE student_id = ?1;",
        [STUDENT],
    )
    .unwrap();
    let err = ledger.external_marks(STUDENT, SUBJECT).unwrap_err();
    assert_eq!(err.code(), "persistence_error");
    assert!(matches!(
        err,
        ServiceError::Persistence(RepoError::InvalidData(_))
    ));

    ledger
        .save_internal(STUDENT, SUBJECT, 1, 45.0, vec![8.0])
        .unwrap();
    conn.execute("UPDATE internal_marks SET fat_marks = -5.0;", [])
        .unwrap();
    assert_eq!(
        ledger.internal_marks(STUDENT, SUBJECT).unwrap_err().code(),
        "persistence_error"
    );
}
