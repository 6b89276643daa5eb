//! D&D 5e character sheet engine.
//!
//! This crate provides:
//! - Derived statistics for characters, NPCs and vehicles (abilities, skills,
//!   armor class, encumbrance, spell slots, experience)
//! - Short and long rest workflows with hit dice and recovery
//! - Death saving throws
//! - JSON persistence for actors
//!
//! # Quick Start
//!
//! ```ignore
//! use dnd_sheet::{JsonFileStore, LongRestOptions, SheetEngine, Workflow};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = JsonFileStore::new("saves/roland.json");
//!     let mut actor = store.load().await?;
//!
//!     let engine = SheetEngine::default();
//!     engine.prepare(&mut actor);
//!
//!     let workflow = Workflow::new(&engine, &store);
//!     let result = workflow.long_rest(&mut actor, LongRestOptions::default(), None).await?;
//!     println!("regained {} hit points", result.map(|r| r.dhp).unwrap_or(0));
//!     Ok(())
//! }
//! ```

pub mod abilities;
pub mod actor;
pub mod armor;
pub mod config;
pub mod death;
pub mod dice;
pub mod encumbrance;
pub mod formula;
pub mod items;
pub mod persist;
pub mod prepare;
pub mod proficiency;
pub mod rest;
pub mod skills;
pub mod spellcasting;
pub mod store;
pub mod testing;

// Primary public API
pub use actor::{Ability, Actor, ActorDetails, ActorId, Skill};
pub use armor::{AcCalc, AcWarning, ArmorClassBlock};
pub use config::{ProficiencyMode, RestVariant, RulesConfig, WeightUnits};
pub use death::{DeathSaveOutcome, DeathSaveResult};
pub use dice::{DiceRoller, DieType, RandomRoller};
pub use formula::{Evaluator, Formula, FormulaEvaluator, RollData};
pub use items::{Item, ItemData, ItemId, Progression};
pub use persist::{JsonFileStore, PersistError, SavedActor};
pub use prepare::{Preparation, SheetEngine};
pub use proficiency::{Proficiency, ProficiencyLevel};
pub use rest::{
    HitDiceSession, LongRestOptions, RestDecision, RestError, RestPrompt, RestRequest,
    RestResult, ShortRestOptions, Workflow,
};
pub use store::{ActorStore, StoreError, UpdateBatch, UpdateData};
