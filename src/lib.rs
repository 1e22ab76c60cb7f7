//! # Living Map
//!
//! A pannable/zoomable 2D "living map" simulation core built with Rust.
//!
//! ## Features
//!
//! - **Camera Gestures**: Drag-pan, pinch/wheel zoom and animated focus-on-marker,
//!   driven by an explicit gesture state machine
//! - **Coordinate Pipeline**: Pure world / NDC / screen / mask-pixel mappings
//!   parameterized by the current viewport
//! - **Parallax Depth Model**: Per-layer parallax factors with automatic
//!   geometry over-scale so layers never expose empty edges
//! - **Easing Library**: Named presets and cubic-bezier curves solved with
//!   Newton-Raphson plus bisection fallback
//! - **Procedural Effects**: Mask-constrained particle fields (twinkle, drift,
//!   glow) and roaming sprites with fixed-capacity, allocation-free slot arrays
//!
//! ## Architecture Design
//!
//! The crate defines the math and state machines a renderer drives each frame;
//! rendering itself stays outside:
//! - **CameraController** publishes one immutable `Viewport` snapshot per tick
//! - **ParallaxModel** and all effect simulators read that snapshot, never write it
//! - **MaskSampler** resources load asynchronously off the hot path; simulators
//!   tolerate a missing sampler by degrading to unconstrained behavior
//!
//! ### Example
//!
//! ```no_run
//! use living_map::config::MapConfig;
//! use living_map::core::MapEngine;
//! use living_map::camera::PointerId;
//! use glam::Vec2;
//!
//! let mut engine = MapEngine::new(MapConfig::load_or_default());
//! engine.set_screen_size(Vec2::new(1920.0, 1080.0));
//! engine.pointer_down(PointerId(1), Vec2::new(960.0, 540.0));
//! let frame = engine.tick(1.0 / 60.0);
//! # let _ = frame;
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Engine entry point and error types
//! - [`camera`]: Viewport, gesture state machine and camera controller
//! - [`space`]: Coordinate space mappings
//! - [`parallax`]: Parallax depth model
//! - [`animation`]: Easing resolution and evaluation
//! - [`mask`]: Mask sampling and asynchronous loading
//! - [`effects`]: Particle and sprite simulators
//! - [`config`]: Configuration surface

/// Core engine functionality including the per-frame orchestrator
pub mod core;
/// Viewport, gesture state machine and camera controller
pub mod camera;
/// Coordinate space mappings between world, NDC, screen and mask pixels
pub mod space;
/// Parallax depth model
pub mod parallax;
/// Easing resolution and evaluation
pub mod animation;
/// Mask sampling and asynchronous loading
pub mod mask;
/// Particle and sprite simulators
pub mod effects;
/// Configuration system
pub mod config;
