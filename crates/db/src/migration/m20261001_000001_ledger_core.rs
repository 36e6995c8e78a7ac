//! Ledger core schema.
//!
//! Creates the general ledger, account transactions, vouchers, transaction
//! batches and their side tables. Every table carries the tenant and audit
//! columns; money is `NUMERIC(19,2)`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CHART OF ACCOUNTS AND BRANCH SETTINGS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(BRANCH_SETTINGS_SQL).await?;

        // ============================================================
        // PART 3: TRANSACTION BATCHES
        // ============================================================
        db.execute_unprepared(TRANSACTION_BATCHES_SQL).await?;
        db.execute_unprepared(BATCH_SIDE_TABLES_SQL).await?;

        // ============================================================
        // PART 4: BOOKS AND VOUCHERS
        // ============================================================
        db.execute_unprepared(ACCOUNT_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(JOURNAL_VOUCHERS_SQL).await?;
        db.execute_unprepared(CASH_CHECK_VOUCHERS_SQL).await?;

        // ============================================================
        // PART 5: GENERAL LEDGER
        // ============================================================
        db.execute_unprepared(GENERAL_LEDGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE ledger_source AS ENUM (
    'withdraw', 'deposit', 'journal', 'payment', 'adjustment',
    'journal-voucher', 'check-voucher', 'loan', 'savings-interest',
    'mutual-contribution', 'disbursement', 'blotter'
);
CREATE TYPE account_transaction_source AS ENUM (
    'daily-collection-book', 'cash-check-disbursement-book', 'general-journal'
);
CREATE TYPE payment_kind AS ENUM ('cash', 'check', 'online', 'adjustment');
CREATE TYPE general_ledger_type AS ENUM ('assets', 'liabilities', 'equity', 'revenue', 'expenses');
CREATE TYPE account_kind AS ENUM ('deposit', 'loan', 'fines', 'other');
CREATE TYPE cash_check_voucher_status AS ENUM ('pending', 'printed', 'approved', 'released');
CREATE TYPE journal_voucher_status AS ENUM ('draft', 'posted', 'cancelled');
CREATE TYPE batch_balance_status AS ENUM ('balanced', 'balance overage', 'balance shortage');
CREATE TYPE remittance_kind AS ENUM ('check', 'online');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id     UUID NOT NULL,
    branch_id           UUID NOT NULL,
    code                VARCHAR(50),
    name                VARCHAR(255) NOT NULL,
    general_ledger_type general_ledger_type,
    account_kind        account_kind NOT NULL DEFAULT 'other',
    currency            CHAR(3) NOT NULL DEFAULT 'PHP',
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by          UUID,
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by          UUID,
    deleted_at          TIMESTAMPTZ,
    deleted_by          UUID
);

CREATE INDEX idx_accounts_tenant ON accounts(organization_id, branch_id) WHERE deleted_at IS NULL;
";

const BRANCH_SETTINGS_SQL: &str = r"
CREATE TABLE branch_settings (
    id                          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id             UUID NOT NULL,
    branch_id                   UUID NOT NULL,
    cash_on_hand_account_id     UUID REFERENCES accounts(id),

    withdraw_or_start           BIGINT NOT NULL DEFAULT 1,
    withdraw_or_current         BIGINT NOT NULL DEFAULT 1,
    withdraw_or_end             BIGINT NOT NULL DEFAULT 999999,
    withdraw_or_iteration       BIGINT NOT NULL DEFAULT 1,
    deposit_or_start            BIGINT NOT NULL DEFAULT 1,
    deposit_or_current          BIGINT NOT NULL DEFAULT 1,
    deposit_or_end              BIGINT NOT NULL DEFAULT 999999,
    deposit_or_iteration        BIGINT NOT NULL DEFAULT 1,
    loan_or_start               BIGINT NOT NULL DEFAULT 1,
    loan_or_current             BIGINT NOT NULL DEFAULT 1,
    loan_or_end                 BIGINT NOT NULL DEFAULT 999999,
    loan_or_iteration           BIGINT NOT NULL DEFAULT 1,
    check_voucher_or_start      BIGINT NOT NULL DEFAULT 1,
    check_voucher_or_current    BIGINT NOT NULL DEFAULT 1,
    check_voucher_or_end        BIGINT NOT NULL DEFAULT 999999,
    check_voucher_or_iteration  BIGINT NOT NULL DEFAULT 1,

    created_at                  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by                  UUID,
    updated_at                  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by                  UUID,
    deleted_at                  TIMESTAMPTZ,
    deleted_by                  UUID
);

CREATE UNIQUE INDEX uq_branch_settings_branch
    ON branch_settings(organization_id, branch_id)
    WHERE deleted_at IS NULL;
";

const TRANSACTION_BATCHES_SQL: &str = r"
CREATE TABLE transaction_batches (
    id                                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id                     UUID NOT NULL,
    branch_id                           UUID NOT NULL,
    employee_user_id                    UUID NOT NULL,

    batch_name                          VARCHAR(50),
    currency                            CHAR(3) NOT NULL DEFAULT 'PHP',
    description                         TEXT,

    total_cash_collection               NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_deposit_entry                 NUMERIC(19,2) NOT NULL DEFAULT 0,
    beginning_balance                   NUMERIC(19,2) NOT NULL DEFAULT 0,
    deposit_in_bank                     NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (deposit_in_bank >= 0),
    cash_count_total                    NUMERIC(19,2) NOT NULL DEFAULT 0,
    grand_total                         NUMERIC(19,2) NOT NULL DEFAULT 0,
    petty_cash                          NUMERIC(19,2) NOT NULL DEFAULT 0,
    loan_releases                       NUMERIC(19,2) NOT NULL DEFAULT 0,
    time_deposit_withdrawal             NUMERIC(19,2) NOT NULL DEFAULT 0,
    savings_withdrawal                  NUMERIC(19,2) NOT NULL DEFAULT 0,
    cash_check_voucher_total            NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_cash_handled                  NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_supposed_remittance           NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_cash_on_hand                  NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_check_remittance              NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_online_remittance             NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_deposit_in_bank               NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_actual_remittance             NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_actual_supposed_comparison    NUMERIC(19,2) NOT NULL DEFAULT 0,
    balance_status                      batch_balance_status,

    is_closed                           BOOLEAN NOT NULL DEFAULT FALSE,
    request_view                        BOOLEAN NOT NULL DEFAULT FALSE,
    can_view                            BOOLEAN NOT NULL DEFAULT FALSE,
    ended_at                            TIMESTAMPTZ,

    employee_by_name                    VARCHAR(255),
    employee_by_position                VARCHAR(255),
    employee_by_signature_media_id      UUID,
    signatories                         JSONB NOT NULL DEFAULT '{}'::jsonb,

    created_at                          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by                          UUID,
    updated_at                          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by                          UUID,
    deleted_at                          TIMESTAMPTZ,
    deleted_by                          UUID,

    CONSTRAINT chk_closed_has_end CHECK (NOT is_closed OR ended_at IS NOT NULL)
);

CREATE UNIQUE INDEX uq_transaction_batches_open
    ON transaction_batches(organization_id, branch_id, employee_user_id)
    WHERE is_closed = FALSE AND deleted_at IS NULL;
CREATE INDEX idx_transaction_batches_view
    ON transaction_batches(organization_id, branch_id)
    WHERE request_view = TRUE AND can_view = FALSE AND deleted_at IS NULL;
CREATE INDEX idx_transaction_batches_ended
    ON transaction_batches(organization_id, branch_id, ended_at)
    WHERE is_closed = TRUE AND deleted_at IS NULL;
";

const BATCH_SIDE_TABLES_SQL: &str = r"
CREATE TABLE batch_fundings (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id         UUID NOT NULL,
    branch_id               UUID NOT NULL,
    transaction_batch_id    UUID NOT NULL REFERENCES transaction_batches(id),
    provided_by_user_id     UUID,
    name                    VARCHAR(255),
    description             TEXT,
    amount                  NUMERIC(19,2) NOT NULL CHECK (amount >= 0),
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by              UUID,
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by              UUID,
    deleted_at              TIMESTAMPTZ,
    deleted_by              UUID
);

CREATE TABLE cash_counts (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id         UUID NOT NULL,
    branch_id               UUID NOT NULL,
    transaction_batch_id    UUID NOT NULL REFERENCES transaction_batches(id),
    bill_amount             NUMERIC(19,2) NOT NULL CHECK (bill_amount >= 0),
    quantity                INTEGER NOT NULL CHECK (quantity >= 0),
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by              UUID,
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by              UUID,
    deleted_at              TIMESTAMPTZ,
    deleted_by              UUID
);

CREATE TABLE batch_remittances (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id         UUID NOT NULL,
    branch_id               UUID NOT NULL,
    transaction_batch_id    UUID NOT NULL REFERENCES transaction_batches(id),
    kind                    remittance_kind NOT NULL,
    reference_number        VARCHAR(100),
    amount                  NUMERIC(19,2) NOT NULL CHECK (amount >= 0),
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by              UUID,
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by              UUID,
    deleted_at              TIMESTAMPTZ,
    deleted_by              UUID
);

CREATE TABLE disbursement_transactions (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id         UUID NOT NULL,
    branch_id               UUID NOT NULL,
    transaction_batch_id    UUID NOT NULL REFERENCES transaction_batches(id),
    description             TEXT,
    amount                  NUMERIC(19,2) NOT NULL CHECK (amount >= 0),
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by              UUID,
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by              UUID,
    deleted_at              TIMESTAMPTZ,
    deleted_by              UUID
);

CREATE INDEX idx_batch_fundings_batch ON batch_fundings(transaction_batch_id) WHERE deleted_at IS NULL;
CREATE INDEX idx_cash_counts_batch ON cash_counts(transaction_batch_id) WHERE deleted_at IS NULL;
CREATE INDEX idx_batch_remittances_batch ON batch_remittances(transaction_batch_id) WHERE deleted_at IS NULL;
CREATE INDEX idx_disbursement_transactions_batch ON disbursement_transactions(transaction_batch_id) WHERE deleted_at IS NULL;
";

const ACCOUNT_TRANSACTIONS_SQL: &str = r"
CREATE TABLE account_transactions (
    id                  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id     UUID NOT NULL,
    branch_id           UUID NOT NULL,
    source              account_transaction_source NOT NULL,
    transaction_date    DATE NOT NULL,
    jv_number           VARCHAR(100),
    description         TEXT,
    debit               NUMERIC(19,2) NOT NULL DEFAULT 0,
    credit              NUMERIC(19,2) NOT NULL DEFAULT 0,
    created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by          UUID,
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by          UUID,
    deleted_at          TIMESTAMPTZ,
    deleted_by          UUID
);

CREATE TABLE account_transaction_entries (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id         UUID NOT NULL,
    branch_id               UUID NOT NULL,
    account_transaction_id  UUID NOT NULL REFERENCES account_transactions(id),
    account_id              UUID NOT NULL REFERENCES accounts(id),
    debit                   NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit                  NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    description             TEXT,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by              UUID,
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by              UUID,
    deleted_at              TIMESTAMPTZ,
    deleted_by              UUID
);

CREATE INDEX idx_account_transactions_date
    ON account_transactions(organization_id, branch_id, transaction_date)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_account_transaction_entries_parent
    ON account_transaction_entries(account_transaction_id)
    WHERE deleted_at IS NULL;
";

const JOURNAL_VOUCHERS_SQL: &str = r"
CREATE TABLE journal_vouchers (
    id                              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id                 UUID NOT NULL,
    branch_id                       UUID NOT NULL,
    voucher_number                  VARCHAR(100),
    voucher_date                    DATE NOT NULL,
    description                     TEXT,
    reference                       VARCHAR(255),
    currency                        CHAR(3) NOT NULL DEFAULT 'PHP',
    status                          journal_voucher_status NOT NULL DEFAULT 'draft',
    print_count                     INTEGER NOT NULL DEFAULT 0,
    transaction_batch_id            UUID REFERENCES transaction_batches(id),
    total_debit                     NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_credit                    NUMERIC(19,2) NOT NULL DEFAULT 0,

    printed_by                      UUID,
    printed_by_name                 VARCHAR(255),
    printed_by_position             VARCHAR(255),
    printed_by_signature_media_id   UUID,
    printed_date                    TIMESTAMPTZ,
    approved_by                     UUID,
    approved_by_name                VARCHAR(255),
    approved_by_position            VARCHAR(255),
    approved_by_signature_media_id  UUID,
    approved_date                   TIMESTAMPTZ,
    released_by                     UUID,
    released_by_name                VARCHAR(255),
    released_by_position            VARCHAR(255),
    released_by_signature_media_id  UUID,
    released_date                   TIMESTAMPTZ,

    created_at                      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by                      UUID,
    updated_at                      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by                      UUID,
    deleted_at                      TIMESTAMPTZ,
    deleted_by                      UUID,

    CONSTRAINT chk_jv_checkpoint_order CHECK (
        (approved_date IS NULL OR (printed_date IS NOT NULL AND printed_date <= approved_date))
        AND (released_date IS NULL OR (approved_date IS NOT NULL AND approved_date <= released_date))
    )
);

CREATE TABLE journal_voucher_entries (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id         UUID NOT NULL,
    branch_id               UUID NOT NULL,
    journal_voucher_id      UUID NOT NULL REFERENCES journal_vouchers(id),
    account_id              UUID NOT NULL REFERENCES accounts(id),
    member_profile_id       UUID,
    employee_user_id        UUID,
    loan_transaction_id     UUID,
    debit                   NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit                  NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    description             TEXT,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by              UUID,
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by              UUID,
    deleted_at              TIMESTAMPTZ,
    deleted_by              UUID
);

CREATE INDEX idx_journal_vouchers_stage
    ON journal_vouchers(organization_id, branch_id, printed_date, approved_date, released_date)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_journal_voucher_entries_parent
    ON journal_voucher_entries(journal_voucher_id)
    WHERE deleted_at IS NULL;
";

const CASH_CHECK_VOUCHERS_SQL: &str = r"
CREATE TABLE cash_check_vouchers (
    id                              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id                 UUID NOT NULL,
    branch_id                       UUID NOT NULL,
    voucher_number                  VARCHAR(100),
    pay_to                          VARCHAR(255),
    check_number                    VARCHAR(100),
    check_date                      DATE,
    description                     TEXT,
    currency                        CHAR(3) NOT NULL DEFAULT 'PHP',
    status                          cash_check_voucher_status NOT NULL DEFAULT 'pending',
    print_count                     INTEGER NOT NULL DEFAULT 0,
    transaction_batch_id            UUID REFERENCES transaction_batches(id),
    total_debit                     NUMERIC(19,2) NOT NULL DEFAULT 0,
    total_credit                    NUMERIC(19,2) NOT NULL DEFAULT 0,
    signatories                     JSONB NOT NULL DEFAULT '{}'::jsonb,

    printed_by                      UUID,
    printed_by_name                 VARCHAR(255),
    printed_by_position             VARCHAR(255),
    printed_by_signature_media_id   UUID,
    printed_date                    TIMESTAMPTZ,
    approved_by                     UUID,
    approved_by_name                VARCHAR(255),
    approved_by_position            VARCHAR(255),
    approved_by_signature_media_id  UUID,
    approved_date                   TIMESTAMPTZ,
    released_by                     UUID,
    released_by_name                VARCHAR(255),
    released_by_position            VARCHAR(255),
    released_by_signature_media_id  UUID,
    released_date                   TIMESTAMPTZ,

    created_at                      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by                      UUID,
    updated_at                      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by                      UUID,
    deleted_at                      TIMESTAMPTZ,
    deleted_by                      UUID,

    CONSTRAINT chk_ccv_checkpoint_order CHECK (
        (approved_date IS NULL OR (printed_date IS NOT NULL AND printed_date <= approved_date))
        AND (released_date IS NULL OR (approved_date IS NOT NULL AND approved_date <= released_date))
    )
);

CREATE TABLE cash_check_voucher_entries (
    id                      UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id         UUID NOT NULL,
    branch_id               UUID NOT NULL,
    cash_check_voucher_id   UUID NOT NULL REFERENCES cash_check_vouchers(id),
    account_id              UUID NOT NULL REFERENCES accounts(id),
    member_profile_id       UUID,
    employee_user_id        UUID,
    loan_transaction_id     UUID,
    debit                   NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit                  NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    description             TEXT,
    created_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by              UUID,
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by              UUID,
    deleted_at              TIMESTAMPTZ,
    deleted_by              UUID
);

CREATE INDEX idx_cash_check_vouchers_status
    ON cash_check_vouchers(organization_id, branch_id, status)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_cash_check_voucher_entries_parent
    ON cash_check_voucher_entries(cash_check_voucher_id)
    WHERE deleted_at IS NULL;
";

const GENERAL_LEDGERS_SQL: &str = r"
CREATE TABLE general_ledgers (
    id                          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    organization_id             UUID NOT NULL,
    branch_id                   UUID NOT NULL,
    account_id                  UUID NOT NULL REFERENCES accounts(id),
    member_profile_id           UUID,
    member_joint_account_id     UUID,
    scope_member_profile_id     UUID,
    transaction_id              UUID,
    transaction_batch_id        UUID REFERENCES transaction_batches(id),
    account_transaction_id      UUID REFERENCES account_transactions(id),
    journal_voucher_id          UUID REFERENCES journal_vouchers(id),
    cash_check_voucher_id       UUID REFERENCES cash_check_vouchers(id),
    loan_transaction_id         UUID,
    employee_user_id            UUID,
    payment_type_id             UUID,
    source                      ledger_source NOT NULL,
    payment_kind                payment_kind,
    reference_number            VARCHAR(50),
    description                 TEXT,
    currency                    CHAR(3) NOT NULL DEFAULT 'PHP',
    debit                       NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit                      NUMERIC(19,2) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    balance                     NUMERIC(19,2) NOT NULL,
    balance_version             BIGINT NOT NULL CHECK (balance_version > 0),
    entry_date                  TIMESTAMPTZ,
    print_number                INTEGER NOT NULL DEFAULT 0,
    created_at                  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_by                  UUID,
    updated_at                  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by                  UUID,
    deleted_at                  TIMESTAMPTZ,
    deleted_by                  UUID,

    CONSTRAINT chk_scope_member_matches CHECK (
        scope_member_profile_id IS NULL OR scope_member_profile_id = member_profile_id
    )
);

-- Balance resolution: latest line per scope
CREATE INDEX idx_general_ledgers_scope_latest
    ON general_ledgers(
        organization_id, branch_id, account_id, scope_member_profile_id,
        entry_date DESC NULLS LAST, created_at DESC, balance_version DESC
    )
    WHERE deleted_at IS NULL;

-- One line per scope version; a lost update surfaces as a unique violation
CREATE UNIQUE INDEX uq_general_ledgers_scope_version
    ON general_ledgers(
        organization_id, branch_id, account_id,
        COALESCE(scope_member_profile_id, '00000000-0000-0000-0000-000000000000'::uuid),
        balance_version
    )
    WHERE deleted_at IS NULL;

CREATE INDEX idx_general_ledgers_member
    ON general_ledgers(organization_id, branch_id, member_profile_id, account_id)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_general_ledgers_batch
    ON general_ledgers(transaction_batch_id, source)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_general_ledgers_created
    ON general_ledgers(organization_id, branch_id, created_at)
    WHERE deleted_at IS NULL;
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS general_ledgers;
DROP TABLE IF EXISTS cash_check_voucher_entries;
DROP TABLE IF EXISTS cash_check_vouchers;
DROP TABLE IF EXISTS journal_voucher_entries;
DROP TABLE IF EXISTS journal_vouchers;
DROP TABLE IF EXISTS account_transaction_entries;
DROP TABLE IF EXISTS account_transactions;
DROP TABLE IF EXISTS disbursement_transactions;
DROP TABLE IF EXISTS batch_remittances;
DROP TABLE IF EXISTS cash_counts;
DROP TABLE IF EXISTS batch_fundings;
DROP TABLE IF EXISTS transaction_batches;
DROP TABLE IF EXISTS branch_settings;
DROP TABLE IF EXISTS accounts;
DROP TYPE IF EXISTS remittance_kind;
DROP TYPE IF EXISTS batch_balance_status;
DROP TYPE IF EXISTS journal_voucher_status;
DROP TYPE IF EXISTS cash_check_voucher_status;
DROP TYPE IF EXISTS account_kind;
DROP TYPE IF EXISTS general_ledger_type;
DROP TYPE IF EXISTS payment_kind;
DROP TYPE IF EXISTS account_transaction_source;
DROP TYPE IF EXISTS ledger_source;
";
