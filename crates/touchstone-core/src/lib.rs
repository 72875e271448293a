//! Core types for the touchstone gesture engine.
//!
//! This crate provides the platform-neutral vocabulary the engine is built on:
//! - Geometric primitives: [`Point`]
//! - Direction bitmask: [`Direction`]
//! - Element identity and containment: [`ElementId`], [`Surface`], [`ElementTree`]
//! - Raw input events: [`RawInput`] and its mouse, pointer and touch variants

mod direction;
mod element;
mod event;
mod geometry;

pub use direction::{Direction, ParseDirectionError};
pub use element::{DispatchedEvent, ElementId, ElementTree, Surface};
pub use event::{
    MouseButton, MouseInput, MouseKind, ParsePointerTypeError, PointerId, PointerInput,
    PointerKind, PointerType, RawInput, Touch, TouchInput, TouchKind, PRIMARY_BUTTON,
};
pub use geometry::Point;
