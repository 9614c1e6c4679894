//! End-to-end workflow tests against a real Postgres database.
//!
//! Requires `DATABASE_URL` to point at a disposable database; the schema is
//! recreated from scratch on every run. Without `DATABASE_URL` the test is
//! skipped so the suite stays green on machines without Postgres.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use siren_core::workflow::{
    BillDraft, BillStatus, PaymentDraft, Principal, Role, WorkflowError,
};
use siren_db::migration::Migrator;
use siren_db::repositories::{
    ambulance::UpdateAmbulanceInput, AmbulanceRepository, AssignmentRepository, AuditRepository,
    BillQuery, RegionRepository, UpdateUserInput, UserRepository, WorkflowRepository,
};

struct Fixture {
    db: DatabaseConnection,
    admin: Principal,
    operator: Principal,
    level1: Principal,
    level2: Principal,
    accounts: Principal,
    region_id: Uuid,
    ambulance_id: Uuid,
}

async fn setup() -> Option<Fixture> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database tests");
        return None;
    };

    let db = siren_db::connect(&url, 5).await.expect("connect");
    Migrator::fresh(&db).await.expect("fresh migration");

    let users = UserRepository::new(db.clone());
    let regions = RegionRepository::new(db.clone());
    let ambulances = AmbulanceRepository::new(db.clone());

    let region = regions
        .create("North District", "Pune", "Maharashtra")
        .await
        .expect("region");

    let mut principals = Vec::new();
    for (email, role) in [
        ("admin@test.local", Role::Admin),
        ("operator@test.local", Role::Operator),
        ("level1@test.local", Role::Level1),
        ("level2@test.local", Role::Level2),
        ("accounts@test.local", Role::Accounts),
    ] {
        let scope: Vec<Uuid> = if matches!(role, Role::Level1 | Role::Level2 | Role::Accounts) {
            vec![region.id]
        } else {
            Vec::new()
        };
        let user = users
            .create(email, "$argon2id$stub", "Test User", role, &scope)
            .await
            .expect("user");
        principals.push(user.principal());
    }

    let ambulance = ambulances
        .create(
            "AMB-101",
            "North District Unit 1",
            region.id,
            &[principals[1].id],
        )
        .await
        .expect("ambulance");

    Some(Fixture {
        db,
        admin: principals[0],
        operator: principals[1],
        level1: principals[2],
        level2: principals[3],
        accounts: principals[4],
        region_id: region.id,
        ambulance_id: ambulance.id,
    })
}

fn draft(ambulance_id: Uuid) -> BillDraft {
    BillDraft {
        ambulance_id,
        title: "Oxygen cylinder refill".to_string(),
        vendor: "MedSupply Co".to_string(),
        amount: dec!(4500.00),
        currency: "INR".to_string(),
        invoice_number: "INV-2231".to_string(),
        invoice_date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
        description: Some("Monthly refill".to_string()),
    }
}

fn payment() -> PaymentDraft {
    PaymentDraft {
        amount_paid: dec!(4500.00),
        payment_mode: "NEFT".to_string(),
        reference_no: "UTR-88341".to_string(),
        payment_date: NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
        notes: Some("Paid via treasury account".to_string()),
    }
}

// Single sequential test so the fresh-schema setup is not raced by other
// tests in the binary.
#[tokio::test]
async fn full_workflow_end_to_end() {
    let Some(fx) = setup().await else {
        return;
    };

    let workflow = WorkflowRepository::new(fx.db.clone());
    let audit = AuditRepository::new(fx.db.clone());

    // Operator submits a bill; it lands in PENDING_L1 with a creation log.
    let bill = workflow
        .create_bill(&fx.operator, &draft(fx.ambulance_id), None)
        .await
        .expect("create bill");
    assert_eq!(
        bill.status,
        siren_db::entities::sea_orm_active_enums::BillStatus::PendingL1
    );

    let logs = audit.list_for_bill(bill.id).await.expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].from_status, None);
    assert_eq!(logs[0].note.as_deref(), Some("Bill submitted"));

    // Accounts cannot touch a bill that is still in review.
    let err = workflow
        .record_payment(&fx.accounts, bill.id, &payment())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotReadyForPayment { .. }));

    // Level-2 cannot act before level-1.
    let err = workflow
        .transition_bill(&fx.level2, bill.id, BillStatus::PendingPayment, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::TransitionNotAllowed { .. }));

    // Level-1 forwards, level-2 approves.
    workflow
        .transition_bill(
            &fx.level1,
            bill.id,
            BillStatus::PendingL2,
            Some("Verified".to_string()),
        )
        .await
        .expect("level1 forward");
    workflow
        .transition_bill(&fx.level2, bill.id, BillStatus::PendingPayment, None)
        .await
        .expect("level2 approve");

    // Direct transition to PAID is refused even for accounts.
    let err = workflow
        .transition_bill(&fx.accounts, bill.id, BillStatus::Paid, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::PaidViaTransition));

    // Accounts records the payment; bill flips to PAID atomically.
    let (paid_bill, pay) = workflow
        .record_payment(&fx.accounts, bill.id, &payment())
        .await
        .expect("payment");
    assert_eq!(
        paid_bill.status,
        siren_db::entities::sea_orm_active_enums::BillStatus::Paid
    );
    assert_eq!(pay.amount_paid, dec!(4500.00));
    assert_eq!(
        pay.payment_date,
        NaiveDate::from_ymd_opt(2026, 2, 20).unwrap(),
        "the executed date comes from the request, not the clock"
    );

    // A second payment attempt conflicts: the bill is already PAID.
    let err = workflow
        .record_payment(&fx.accounts, bill.id, &payment())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotReadyForPayment { .. }));

    // Full history, newest first: creation, L1, L2, payment.
    let logs = audit.list_for_bill(bill.id).await.expect("logs");
    assert_eq!(logs.len(), 4);
    assert_eq!(logs[0].note.as_deref(), Some("Payment recorded (NEFT)"));
    assert_eq!(logs[3].from_status, None);

    // Admin reroutes the paid bill back into review; the payment row stays.
    workflow
        .transition_bill(
            &fx.admin,
            bill.id,
            BillStatus::PendingL2,
            Some("Re-audit".to_string()),
        )
        .await
        .expect("admin reroute");
    let detail = workflow.find_bill(bill.id).await.expect("find");
    assert!(detail.payment.is_some());

    // Reviewer region scope round-trips through the link table.
    let users = UserRepository::new(fx.db.clone());
    let scoped = users.list_regions(fx.level1.id).await.expect("regions");
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].name, "North District");

    // Operator scoping: the submitting operator sees the bill, a second
    // unassigned operator does not.
    let other = users
        .create(
            "operator2@test.local",
            "$argon2id$stub",
            "Other Op",
            Role::Operator,
            &[],
        )
        .await
        .expect("second operator");
    let visible = workflow
        .list_bills_for(&fx.operator, &BillQuery::default())
        .await
        .expect("operator queue");
    assert_eq!(visible.len(), 1);
    let hidden = workflow
        .list_bills_for(&other.principal(), &BillQuery::default())
        .await
        .expect("other queue");
    assert!(hidden.is_empty());

    // Unassigned operators cannot submit for this ambulance either.
    let err = workflow
        .create_bill(&other.principal(), &draft(fx.ambulance_id), None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotAssigned { .. }));

    // Assignment checks agree with the scoping above.
    assert!(
        AssignmentRepository::is_assigned(&fx.db, fx.operator.id, fx.ambulance_id)
            .await
            .expect("is_assigned")
    );
    assert!(
        !AssignmentRepository::is_assigned(&fx.db, other.id, fx.ambulance_id)
            .await
            .expect("is_assigned")
    );

    // Admin-created bills are attributed to the ambulance's first assigned
    // operator, not to the admin.
    let admin_bill = workflow
        .create_bill(
            &fx.admin,
            &draft(fx.ambulance_id),
            Some(BillStatus::PendingL2),
        )
        .await
        .expect("admin bill");
    assert_eq!(admin_bill.created_by, fx.operator.id);

    // Operator reassignment rides the ambulance update transaction; the
    // diff adds the new link and later removes only the dropped one.
    let ambulances = AmbulanceRepository::new(fx.db.clone());
    let assignments = AssignmentRepository::new(fx.db.clone());
    ambulances
        .update(
            fx.ambulance_id,
            UpdateAmbulanceInput {
                operator_ids: Some(vec![fx.operator.id, other.id]),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("ambulance");
    let operators = assignments
        .list_operators(fx.ambulance_id)
        .await
        .expect("operators");
    assert_eq!(operators.len(), 2);
    ambulances
        .update(
            fx.ambulance_id,
            UpdateAmbulanceInput {
                operator_ids: Some(vec![fx.operator.id]),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("ambulance");
    assert!(
        !AssignmentRepository::is_assigned(&fx.db, other.id, fx.ambulance_id)
            .await
            .expect("is_assigned")
    );

    // Region rescoping reconciles inside the user update transaction.
    users
        .update(
            fx.accounts.id,
            UpdateUserInput {
                is_active: None,
                region_ids: Some(Vec::new()),
            },
        )
        .await
        .expect("update")
        .expect("user");
    assert!(users
        .list_regions(fx.accounts.id)
        .await
        .expect("regions")
        .is_empty());
    users
        .update(
            fx.accounts.id,
            UpdateUserInput {
                is_active: None,
                region_ids: Some(vec![fx.region_id]),
            },
        )
        .await
        .expect("update")
        .expect("user");

    // Concurrent race: two level-1 reviewers act on the same fresh bill;
    // exactly one wins, the loser revalidates against the new status.
    let bill2 = workflow
        .create_bill(&fx.operator, &draft(fx.ambulance_id), None)
        .await
        .expect("second bill");
    let (a, b) = tokio::join!(
        workflow.transition_bill(&fx.level1, bill2.id, BillStatus::PendingL2, None),
        workflow.transition_bill(&fx.level1, bill2.id, BillStatus::ReturnedL1, None),
    );
    assert_eq!(
        u8::from(a.is_ok()) + u8::from(b.is_ok()),
        1,
        "exactly one concurrent transition must win"
    );
    let logs = audit.list_for_bill(bill2.id).await.expect("logs");
    assert_eq!(logs.len(), 2, "creation plus the single winning transition");

    // Atomicity under a failing sub-write. A principal with no user row
    // trips a foreign key partway through the transaction, so every write
    // already applied must roll back with it.
    let bill3 = workflow
        .create_bill(
            &fx.admin,
            &draft(fx.ambulance_id),
            Some(BillStatus::PendingPayment),
        )
        .await
        .expect("third bill");

    // record_payment: the payment insert itself fails; no payment row, no
    // status change.
    let ghost_accounts = Principal::new(Uuid::new_v4(), Role::Accounts, true);
    let err = workflow
        .record_payment(&ghost_accounts, bill3.id, &payment())
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Database(_)));
    let detail = workflow.find_bill(bill3.id).await.expect("find");
    assert_eq!(
        detail.bill.status,
        siren_db::entities::sea_orm_active_enums::BillStatus::PendingPayment
    );
    assert!(detail.payment.is_none(), "failed payment leaves no row");

    // transition_bill: the status update succeeds inside the transaction,
    // then the audit append fails; the status change must not survive.
    let ghost_admin = Principal::new(Uuid::new_v4(), Role::Admin, true);
    let err = workflow
        .transition_bill(&ghost_admin, bill3.id, BillStatus::PendingL1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Database(_)));
    let detail = workflow.find_bill(bill3.id).await.expect("find");
    assert_eq!(
        detail.bill.status,
        siren_db::entities::sea_orm_active_enums::BillStatus::PendingPayment
    );
    let logs = audit.list_for_bill(bill3.id).await.expect("logs");
    assert_eq!(logs.len(), 1, "only the creation entry survives");

    // A real payment still lands afterwards.
    let (paid3, _) = workflow
        .record_payment(&fx.accounts, bill3.id, &payment())
        .await
        .expect("payment after rollback");
    assert_eq!(
        paid3.status,
        siren_db::entities::sea_orm_active_enums::BillStatus::Paid
    );
}
