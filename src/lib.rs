//! WhatsApp ↔ CRM bridge.
//!
//! Reconciles inbound WhatsApp Cloud API events with CRM records (contact,
//! deal, message log) and relays operator replies back out, mirroring them
//! into the same CRM.

pub mod config;
pub mod crm;
pub mod error;
pub mod event;
pub mod gateway;
pub mod http;
pub mod reconcile;
pub mod relay;
