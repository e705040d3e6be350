//! Anchor computation for diagram connectors.
//!
//! An [`Anchor`] keeps the attachment points of many anchored nodes glued to
//! one anchorage node as either of them moves, resizes or is reparented.
//! Positions come from a [`Strategy`] reading typed parameters, and are
//! kept current by watching the host [`Scene`].
//!
//! ```
//! use diagram_anchors::{Anchor, AnchorKey, ChopBox, Geometry, SceneGraph};
//! use diagram_anchors::parameter::AnchoredReferencePoint;
//! use glam::dvec2;
//!
//! let mut scene = SceneGraph::new();
//! let root = scene.add_root();
//! scene.set_realized(root, true)?;
//! let shape = scene.add_shape(root, Geometry::rect(0.0, 0.0, 100.0, 100.0))?;
//! let wire = scene.add_child(root)?;
//!
//! let mut anchor = Anchor::with_anchorage(&mut scene, ChopBox, Some(shape))?;
//!
//! let end = AnchorKey::new(wire, "end")?;
//! anchor.set_parameter::<AnchoredReferencePoint>(&scene, Some(&end), Some(dvec2(150.0, 50.0)))?;
//! anchor.attach(&mut scene, end.clone())?;
//! assert_eq!(anchor.position(&end)?, Some(dvec2(100.0, 50.0)));
//! # Ok::<(), diagram_anchors::AnchorError>(())
//! ```

pub mod anchor;
pub mod defaults;
pub mod errors;
pub mod geometry;
pub mod log;
pub mod scene;
pub mod strategy;
pub mod types;

pub use anchor::parameter;
pub use anchor::{Anchor, AnchorKey, AnchorStats, PositionChange, PositionMap, SubscriptionId};
pub use errors::{AnchorError, Result};
pub use geometry::Geometry;
pub use scene::{NodeId, Scene, SceneChange, SceneGraph, WatchId, WatchScope};
pub use strategy::{ChopBox, ComputationStrategy, NearestProjection, OrthogonalProjection, Strategy};
pub use types::{Orientation, Rect};
