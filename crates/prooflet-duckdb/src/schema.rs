/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup (idempotent).
///
/// `memory_limit` is passed at runtime from `Config.duckdb_memory_limit`
/// (env `PROOFLET_DUCKDB_MEMORY`, default `"1GB"`). Always set an explicit
/// limit — the DuckDB default (80% of system RAM) is not acceptable for a
/// server process. `SET threads = 2` bounds the background pool; safe for
/// single-writer embedded use.
///
/// NOTE: DuckDB enforces FOREIGN KEY constraints at statement execution time
/// and does not support ALTER TABLE ... DROP CONSTRAINT, so the child tables
/// carry no declared FKs. Widget deletion instead runs all cascade deletes
/// inside one transaction, children first — see delete_widget() in widget.rs.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- WIDGETS
-- ===========================================
CREATE TABLE IF NOT EXISTS widgets (
    id                  VARCHAR PRIMARY KEY,    -- UUID v4
    account_id          VARCHAR NOT NULL,
    name                VARCHAR NOT NULL,
    domain              VARCHAR,                -- referrer validation (advisory)
    position            VARCHAR,
    color               VARCHAR,
    radius              INTEGER,
    shadow              VARCHAR,
    animation           VARCHAR,
    duration_seconds    INTEGER,                -- NULL means "use server default"
    gap_seconds         INTEGER,
    start_delay_seconds INTEGER,
    loop_enabled        BOOLEAN,
    shuffle             BOOLEAN,
    bg_color            VARCHAR,
    bg_opacity          INTEGER,
    target_devices      VARCHAR,                -- JSON array; widget-level device gate
    target_url_patterns VARCHAR,                -- comma-separated glob list; widget-level URL gate
    created_at          TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at          TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_widgets_account ON widgets(account_id);

-- ===========================================
-- NOTIFICATIONS
-- ===========================================
CREATE TABLE IF NOT EXISTS notifications (
    id                  VARCHAR PRIMARY KEY,    -- UUID v4
    widget_id           VARCHAR NOT NULL,       -- parent widget (no declared FK, see above)
    notification_type   VARCHAR NOT NULL,       -- 'purchase' | 'review' | ...
    name                VARCHAR,
    location            VARCHAR,
    message             VARCHAR,
    product_name        VARCHAR,
    rating              INTEGER,                -- 1..5 for review types
    visitor_count       BIGINT,
    stock_count         BIGINT,
    milestone_text      VARCHAR,
    is_active           BOOLEAN NOT NULL DEFAULT TRUE,
    display_timestamp   TIMESTAMP NOT NULL,     -- freshness shown to visitors, editable
    click_url           VARCHAR,
    reward_enabled      BOOLEAN NOT NULL DEFAULT FALSE,
    reward_text         VARCHAR,
    reward_code         VARCHAR,
    behavior_trigger    VARCHAR,
    target_url_patterns VARCHAR,                -- comma-separated glob list
    target_devices      VARCHAR,                -- JSON array of device tags
    target_utms         VARCHAR,                -- JSON object key -> expected value (or null)
    active_time_windows VARCHAR,                -- JSON array of window objects
    created_at          TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
-- Optimised for the selection query: active rows for a widget, newest first.
CREATE INDEX IF NOT EXISTS idx_notifications_selection
    ON notifications(widget_id, is_active, display_timestamp DESC);

-- ===========================================
-- ANALYTICS (append-only)
-- ===========================================
CREATE TABLE IF NOT EXISTS analytics (
    id              VARCHAR NOT NULL,           -- UUID v4
    widget_id       VARCHAR NOT NULL,
    event_type      VARCHAR NOT NULL,           -- 'impression' | 'click' | 'scratch_complete' | 'code_copied'
    notification_id VARCHAR,
    event_timestamp TIMESTAMP NOT NULL,
    url             VARCHAR,
    user_agent      VARCHAR,
    ip_address      VARCHAR
);
CREATE INDEX IF NOT EXISTS idx_analytics_widget_time
    ON analytics(widget_id, event_timestamp DESC);
"#
    )
}
