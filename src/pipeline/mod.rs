//! Hold-to-talk and typed-text pipeline that turns speech into ledger drafts.
//!
//! # Architecture
//!
//! ```text
//! HoldListener / stdin  ──PipelineCommand (mpsc)──┐
//!                                                  ▼
//!                           PipelineController::run()   ← async tokio task
//!                                   │        ▲
//!                                   │        └── SessionEvent (recognizer thread)
//!                                   ├─ CaptureSession       (audio + recognition)
//!                                   ├─ SuggestionProvider   (text → suggestions)
//!                                   ├─ DraftReconciler      (suggestions → drafts)
//!                                   └─ CategoryStore / LedgerStore
//!
//! SharedView (Arc<Mutex<PipelineView>>) ←── read by the front end
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use voice_ledger::capture::{AlwaysGranted, CaptureSession, Unconfigured};
//! use voice_ledger::config::AppConfig;
//! use voice_ledger::pipeline::{new_shared_view, PipelineCommand, PipelineController, PipelineParts};
//! use voice_ledger::store::{MemoryCategoryStore, MemoryLedger};
//! use voice_ledger::suggest::ScriptedProvider;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let view = new_shared_view();
//!     let session = CaptureSession::new(
//!         Arc::new(Unconfigured),
//!         Arc::new(Unconfigured),
//!         Arc::new(AlwaysGranted),
//!         config.speech.locale.clone(),
//!     );
//!     let controller = PipelineController::new(
//!         view.clone(),
//!         PipelineParts {
//!             session,
//!             provider: Arc::new(ScriptedProvider::unavailable()),
//!             categories: Arc::new(MemoryCategoryStore::new()),
//!             ledger: Arc::new(MemoryLedger::new()),
//!         },
//!         &config,
//!     );
//!
//!     let (tx, rx) = mpsc::channel(16);
//!     let task = tokio::spawn(controller.run(rx));
//!     tx.send(PipelineCommand::SubmitText("Coffee 35".into())).await.unwrap();
//!     drop(tx);
//!     task.await.unwrap();
//!
//!     println!("{:?}", view.lock().unwrap().phase);
//! }
//! ```

pub mod controller;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::{PipelineCommand, PipelineController, PipelineError, PipelineParts};
pub use state::{new_shared_view, PipelineEvent, PipelineState, PipelineView, SharedView};
