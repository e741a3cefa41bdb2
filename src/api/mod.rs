/*
 * Responsibility
 * - HTTP surface: versioned REST API (v1), hub endpoints, shared extractors
 */
pub mod extractors;
pub mod hubs;
pub mod v1;
