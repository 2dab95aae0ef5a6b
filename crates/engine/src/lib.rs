//! Split calculation and settlement netting for group purchases.
//!
//! One member of a group buys items on behalf of others. The engine divides
//! each purchase among its participants ([`calculator`]), stores the result
//! as a replace-all split set, and nets the whole history of a group into a
//! short list of payments ([`settlement`]).
//!
//! All money is integer minor units ([`Money`]); no floating point is used.

pub use calculator::{CustomSplit, SplitRequest};
pub use currency::Currency;
pub use error::EngineError;
pub use money::{Money, Percentage};
pub use ops::{Engine, EngineBuilder};
pub use purchase_items::PurchaseItem;
pub use purchases::Purchase;
pub use settlement::{GroupSettlement, MemberBalance, SettlementInstruction};
pub use splits::{Split, SplitResult, SplitRule};

pub mod calculator;
mod currency;
mod error;
mod money;
mod ops;
pub mod settlement;

mod group_members;
mod groups;
mod purchase_items;
mod purchases;
mod splits;

type ResultEngine<T> = Result<T, EngineError>;
