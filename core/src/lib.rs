//! 3D view of a home design.
//!
//! A [`HomeComponent3D`] builds a scene graph from a [`home::Home`], keeps it
//! in sync with every home change, drives the view from the home camera and
//! turns mouse, touch and keyboard input into editing controller calls.

pub mod bounds;
pub mod component;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod gesture;
pub mod home;
pub mod input;
pub mod keyboard;
pub mod object3d;
pub mod operator;
pub mod scene_builder;
pub mod sync;
pub mod tasks;
pub mod view_controller;


// `crate::scene::*` resolves to the scene graph crate
pub use home3d_scene as scene;
pub use home3d_scene::common;

pub use component::HomeComponent3D;
pub use config::{Component3DConfig, GestureConfig, KeyboardConfig, ViewConfig};
pub use controller::{EditingController, ObserverNavigator};
pub use error::{ConfigError, LoadError};
pub use event::{InputDispatcher, InputEvent};
pub use home::{Home, HomeEvent, ObjectId};
pub use object3d::{DefaultObject3DFactory, ModelLoader, Object3D, Object3DFactory};
pub use sync::Synchronizer;
pub use tasks::TaskQueue;
pub use view_controller::ViewController;
