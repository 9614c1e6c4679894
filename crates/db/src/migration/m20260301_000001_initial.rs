//! Initial schema migration.
//!
//! Creates the full schema: enums, regions, users, ambulances, bills, the
//! append-only status log, payments, and attachments.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r#"
-- Enums
CREATE TYPE user_role AS ENUM ('ADMIN', 'OPERATOR', 'LEVEL1', 'LEVEL2', 'ACCOUNTS');
CREATE TYPE bill_status AS ENUM (
    'PENDING_L1', 'PENDING_L2', 'PENDING_PAYMENT', 'PAID',
    'RETURNED_L1', 'REJECTED_L1', 'RETURNED_L2', 'REJECTED_L2'
);

-- Regions
CREATE TABLE regions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(120) NOT NULL UNIQUE,
    city VARCHAR(120) NOT NULL,
    state VARCHAR(120) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Users
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Reviewer/accounts region scoping
CREATE TABLE user_regions (
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    region_id UUID NOT NULL REFERENCES regions(id) ON DELETE CASCADE,
    PRIMARY KEY (user_id, region_id)
);

-- Ambulances
CREATE TABLE ambulances (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(64) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    region_id UUID NOT NULL REFERENCES regions(id) ON DELETE RESTRICT,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_ambulances_region ON ambulances(region_id);

-- Operator assignments; creation time orders "first assigned" resolution
CREATE TABLE ambulance_operators (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ambulance_id UUID NOT NULL REFERENCES ambulances(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (ambulance_id, user_id)
);

CREATE INDEX idx_ambulance_operators_user ON ambulance_operators(user_id);

-- Bills
CREATE TABLE bills (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    ambulance_id UUID NOT NULL REFERENCES ambulances(id) ON DELETE RESTRICT,
    -- Region snapshot at creation time
    region_id UUID NOT NULL REFERENCES regions(id) ON DELETE RESTRICT,
    created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    title VARCHAR(255) NOT NULL,
    vendor VARCHAR(255) NOT NULL,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    currency CHAR(3) NOT NULL DEFAULT 'INR',
    invoice_number VARCHAR(128) NOT NULL,
    invoice_date DATE NOT NULL,
    description TEXT,
    status bill_status NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Queue scans filter by status, then by region or ambulance
CREATE INDEX idx_bills_status ON bills(status, created_at DESC);
CREATE INDEX idx_bills_region ON bills(region_id, status);
CREATE INDEX idx_bills_ambulance ON bills(ambulance_id, created_at DESC);
CREATE INDEX idx_bills_created_by ON bills(created_by, created_at DESC);

-- Append-only audit log; one row per status change, plus one creation row
CREATE TABLE bill_status_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    bill_id UUID NOT NULL REFERENCES bills(id) ON DELETE CASCADE,
    from_status bill_status,
    to_status bill_status NOT NULL,
    actor_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    note TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_bill_status_logs_bill ON bill_status_logs(bill_id, created_at DESC);
CREATE INDEX idx_bill_status_logs_actor ON bill_status_logs(actor_id, created_at DESC);

-- Payments; at most one per bill
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    bill_id UUID NOT NULL UNIQUE REFERENCES bills(id) ON DELETE CASCADE,
    amount_paid NUMERIC(14, 2) NOT NULL CHECK (amount_paid > 0),
    payment_mode VARCHAR(64) NOT NULL,
    reference_no VARCHAR(128) NOT NULL,
    payment_date DATE NOT NULL,
    notes TEXT,
    paid_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    paid_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Attachments
CREATE TABLE attachments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    bill_id UUID NOT NULL REFERENCES bills(id) ON DELETE CASCADE,
    file_name VARCHAR(255) NOT NULL,
    storage_key TEXT NOT NULL UNIQUE,
    content_type VARCHAR(128) NOT NULL,
    file_size BIGINT NOT NULL CHECK (file_size >= 0),
    uploaded_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_attachments_bill ON attachments(bill_id);
"#;

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS attachments CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS bill_status_logs CASCADE;
DROP TABLE IF EXISTS bills CASCADE;
DROP TABLE IF EXISTS ambulance_operators CASCADE;
DROP TABLE IF EXISTS ambulances CASCADE;
DROP TABLE IF EXISTS user_regions CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS regions CASCADE;
DROP TYPE IF EXISTS bill_status;
DROP TYPE IF EXISTS user_role;
";
