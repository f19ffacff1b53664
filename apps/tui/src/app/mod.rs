// App module: session state, background actions and input handling

pub mod actions;
pub mod input;
pub mod state;

pub use actions::AppActions;
pub use input::{handle_input, handle_mouse};
pub use state::{App, AppEvent, AppScreen};
