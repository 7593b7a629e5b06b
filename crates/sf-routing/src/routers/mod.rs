//! Reference flow and quality routers.

mod mixing;
mod pass_through;

pub use mixing::MixingQuality;
pub use pass_through::PassThroughRouter;
