//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (seeded tasks, widget markup, etc.),
//! update only this file.

// ============================================================================
// Seeded Tasks
// ============================================================================

/// Task ID for "Fix login flow"
pub const TASK_1_ID: &str = "task-1";

/// Task ID for "Ship dark mode"
pub const TASK_2_ID: &str = "task-2";

/// Task ID for "Write onboarding docs"
pub const TASK_3_ID: &str = "task-3";

/// Task 1 title
pub const TASK_1_TITLE: &str = "Fix login flow";

/// Task 2 title
pub const TASK_2_TITLE: &str = "Ship dark mode";

/// Task 3 title
pub const TASK_3_TITLE: &str = "Write onboarding docs";

/// Assignee for tasks 1 and 2
pub const ASSIGNEE_ADA: &str = "ada";

// ============================================================================
// Widget Fixtures
// ============================================================================

/// Markup written for every widget artifact.
///
/// The widget registry caches markup process-wide on first load, so every
/// spawned server in a test binary must write identical artifacts.
pub const WIDGET_MARKUP: &str = r#"<div id="taskdeck-root"><p>widget under test</p></div>"#;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
