//! China A-share market analyst
//!
//! Builds an analyst node for one of two modes and runs it against a
//! conversation state:
//!
//! - **quick**: short screening verdict (rating, thesis, key-metric table,
//!   risk, action) for the stock screener
//! - **deep**: full report over market context, fundamentals, technicals and
//!   capital flow, with exit levels
//!
//! The mode is fixed when the analyst is built and selects exactly one
//! instruction template. Each invocation is a single model call; tool calls
//! requested by the model are returned to the caller, not executed here.
//!
//! ```ignore
//! use market_analyst::{Analyst, ConversationState, StaticNameResolver, create_analyst};
//!
//! let analyst = create_analyst(model, toolset, "quick")?;
//! let state = ConversationState::lookup("600519.SH", date, &StaticNameResolver::new())
//!     .with_analysis_request();
//! let result = analyst.invoke(&state).await?;
//! println!("{}", result.report());
//! ```

pub mod analyst;
pub mod config;
pub mod error;
pub mod market;
pub mod mode;
pub mod prompts;
pub mod screener;
pub mod shape;
pub mod state;
pub mod test_support;

pub use analyst::{
    ANALYST_SENDER, AnalysisResult, Analyst, MarketAnalyst, REPORT_KEY, create_analyst,
    create_deep_analyst, create_quick_analyst,
};
pub use config::{AnalystConfig, AnalystConfigBuilder};
pub use error::{AnalystError, Result};
pub use market::{CompanyNameResolver, Market, MarketInfo, StaticNameResolver};
pub use mode::AnalysisMode;
pub use prompts::{PromptContext, PromptProfile};
pub use screener::{
    SCREENER_SENDER, SCREENING_REPORT_KEY, ScreeningResult, StockScreener, create_stock_screener,
};
pub use shape::{QUICK_MAX_CHARS, RequiredField, ShapeContract, ShapeReport};
pub use state::ConversationState;
