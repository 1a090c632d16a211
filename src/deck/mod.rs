pub mod animation;
pub mod card_stack;
pub mod gesture;
pub mod preload;
pub mod session;

pub use card_stack::{CardStack, CardTransform, DeckConfig, ReleaseOutcome, SwipeCommit};
pub use gesture::{GestureConfig, GestureSession, SwipeDecision};
pub use preload::{CachedCard, PreloadCache};
pub use session::{DeckEvent, DeckServices, SwipeSession};
