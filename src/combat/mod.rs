pub mod formulas;
pub mod info;
pub mod mp_pool;
pub mod stance;
pub mod stat;

pub use info::BattlerInfo;
pub use mp_pool::{MpPool, PoolChange};
pub use stance::{Stance, StanceTransitions, StanceTrigger};
pub use stat::{GrowthCurve, Stat};
