// Composition root for the sales groups sync core.
//
// Responsibilities:
// - Read config from environment.
// - Instantiate the concrete gateway and notifier.
// - Wire queue, event bus and store into a SyncContext and run the background sync worker.
//
// The binary entry point lives in main.rs next to this file and only uses the public API.

pub mod config;
pub mod context;
