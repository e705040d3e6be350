//! Typed strategy parameters.
//!
//! A parameter is either shared by every key of an anchor
//! ([`ParameterKind::Anchorage`]) or owned by a single key
//! ([`ParameterKind::Anchored`]). Parameter types form a closed set; typed
//! access goes through the [`ParameterSpec`] markers, and default
//! construction goes through explicit factories supplied by each strategy.

use std::collections::BTreeMap;
use std::fmt;

use glam::DVec2;

use crate::errors::{AnchorError, Result};
use crate::geometry::Geometry;
use crate::scene::{NodeId, Scene};
use crate::types::Orientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// One value shared by all keys attached to the anchor
    Anchorage,
    /// One value per attached key
    Anchored,
}

/// Tag naming each parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterType {
    AnchorageReferenceGeometry,
    AnchoredReferencePoint,
    PreferredOrientation,
}

impl ParameterType {
    pub fn kind(self) -> ParameterKind {
        match self {
            ParameterType::AnchorageReferenceGeometry => ParameterKind::Anchorage,
            ParameterType::AnchoredReferencePoint | ParameterType::PreferredOrientation => {
                ParameterKind::Anchored
            }
        }
    }

    /// Optional parameters never block computation when absent
    pub fn is_optional(self) -> bool {
        matches!(self, ParameterType::PreferredOrientation)
    }

    pub fn name(self) -> &'static str {
        match self {
            ParameterType::AnchorageReferenceGeometry => "anchorage-reference-geometry",
            ParameterType::AnchoredReferencePoint => "anchored-reference-point",
            ParameterType::PreferredOrientation => "preferred-orientation",
        }
    }

    fn accepts(self, value: &ParamValue) -> bool {
        matches!(
            (self, value),
            (ParameterType::AnchorageReferenceGeometry, ParamValue::Geometry(_))
                | (ParameterType::AnchoredReferencePoint, ParamValue::Point(_))
                | (ParameterType::PreferredOrientation, ParamValue::Orientation(_))
        )
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Untyped parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Geometry(Geometry),
    Point(DVec2),
    Orientation(Orientation),
}

// ============================================================================
// Bindings
// ============================================================================

/// An external source a parameter can track instead of holding a set value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// The anchorage node's own local geometry
    AnchorageGeometry,
    /// The center of the anchored node's local geometry bounds
    AnchoredCenter,
}

impl Binding {
    pub fn name(self) -> &'static str {
        match self {
            Binding::AnchorageGeometry => "anchorage-geometry",
            Binding::AnchoredCenter => "anchored-center",
        }
    }

    /// Whether this source can feed a parameter of type `ty`
    pub fn provides(self, ty: ParameterType) -> bool {
        matches!(
            (self, ty),
            (Binding::AnchorageGeometry, ParameterType::AnchorageReferenceGeometry)
                | (Binding::AnchoredCenter, ParameterType::AnchoredReferencePoint)
        )
    }

    /// Read the current value of the source
    pub fn evaluate(
        self,
        scene: &dyn Scene,
        anchorage: Option<NodeId>,
        anchored: Option<NodeId>,
    ) -> Option<ParamValue> {
        match self {
            Binding::AnchorageGeometry => scene.geometry(anchorage?).cloned().map(ParamValue::Geometry),
            Binding::AnchoredCenter => scene
                .geometry(anchored?)
                .map(|g| ParamValue::Point(g.bounds().center())),
        }
    }
}

// ============================================================================
// Parameter
// ============================================================================

/// A reactive input cell of one parameter type
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    ty: ParameterType,
    value: Option<ParamValue>,
    binding: Option<Binding>,
}

impl Parameter {
    /// An unbound parameter with no value
    pub fn new(ty: ParameterType) -> Self {
        Parameter {
            ty,
            value: None,
            binding: None,
        }
    }

    /// A parameter tracking `binding`; the value is filled on first refresh
    pub fn bound(ty: ParameterType, binding: Binding) -> Self {
        Parameter {
            ty,
            value: None,
            binding: Some(binding),
        }
    }

    pub fn ty(&self) -> ParameterType {
        self.ty
    }

    pub fn kind(&self) -> ParameterKind {
        self.ty.kind()
    }

    pub fn is_optional(&self) -> bool {
        self.ty.is_optional()
    }

    pub fn value(&self) -> Option<&ParamValue> {
        self.value.as_ref()
    }

    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Typed view of the value; `None` when absent or of another type
    pub fn get<P: ParameterSpec>(&self) -> Option<&P::Value> {
        if self.ty != P::TYPE {
            return None;
        }
        self.value.as_ref().and_then(P::unwrap)
    }

    /// Set the value manually. Refused while bound. Returns whether the
    /// value changed.
    pub(crate) fn set(&mut self, value: Option<ParamValue>) -> Result<bool> {
        if self.binding.is_some() {
            return Err(AnchorError::ParameterBound { ty: self.ty });
        }
        debug_assert!(value.as_ref().is_none_or(|v| self.ty.accepts(v)));
        Ok(self.assign(value))
    }

    fn assign(&mut self, value: Option<ParamValue>) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }

    /// Make the parameter track `binding`. The value is kept until the next
    /// refresh.
    pub(crate) fn bind(&mut self, binding: Binding) -> Result<()> {
        if !binding.provides(self.ty) {
            return Err(AnchorError::BindingTypeMismatch {
                ty: self.ty,
                binding: binding.name(),
            });
        }
        self.binding = Some(binding);
        Ok(())
    }

    /// Stop tracking the bound source; the last value stays
    pub(crate) fn unbind(&mut self) -> Option<Binding> {
        self.binding.take()
    }

    /// Re-evaluate the binding, if any. Returns whether the value changed.
    pub(crate) fn refresh(
        &mut self,
        scene: &dyn Scene,
        anchorage: Option<NodeId>,
        anchored: Option<NodeId>,
    ) -> bool {
        match self.binding {
            Some(binding) => self.assign(binding.evaluate(scene, anchorage, anchored)),
            None => false,
        }
    }
}

/// Constructs a default parameter of one type
pub type ParameterFactory = fn() -> Parameter;

// ============================================================================
// Typed access
// ============================================================================

/// Compile-time description of one parameter type
pub trait ParameterSpec {
    type Value: Clone + PartialEq + fmt::Debug;
    const TYPE: ParameterType;

    fn wrap(value: Self::Value) -> ParamValue;
    fn unwrap(value: &ParamValue) -> Option<&Self::Value>;

    /// Default-constructed parameter of this type
    fn create() -> Parameter {
        Parameter::new(Self::TYPE)
    }
}

/// Outline the anchored targets are projected onto, in anchorage-local
/// coordinates. Defaults to tracking the anchorage's own geometry.
#[derive(Debug, Clone, Copy)]
pub struct AnchorageReferenceGeometry;

impl ParameterSpec for AnchorageReferenceGeometry {
    type Value = Geometry;
    const TYPE: ParameterType = ParameterType::AnchorageReferenceGeometry;

    fn wrap(value: Geometry) -> ParamValue {
        ParamValue::Geometry(value)
    }

    fn unwrap(value: &ParamValue) -> Option<&Geometry> {
        match value {
            ParamValue::Geometry(g) => Some(g),
            _ => None,
        }
    }

    fn create() -> Parameter {
        Parameter::bound(Self::TYPE, Binding::AnchorageGeometry)
    }
}

/// Point the anchored target wants to be connected towards, in
/// anchored-local coordinates
#[derive(Debug, Clone, Copy)]
pub struct AnchoredReferencePoint;

impl ParameterSpec for AnchoredReferencePoint {
    type Value = DVec2;
    const TYPE: ParameterType = ParameterType::AnchoredReferencePoint;

    fn wrap(value: DVec2) -> ParamValue {
        ParamValue::Point(value)
    }

    fn unwrap(value: &ParamValue) -> Option<&DVec2> {
        match value {
            ParamValue::Point(p) => Some(p),
            _ => None,
        }
    }
}

/// Axis hint for orthogonal projection; absent means no hint
#[derive(Debug, Clone, Copy)]
pub struct PreferredOrientation;

impl ParameterSpec for PreferredOrientation {
    type Value = Orientation;
    const TYPE: ParameterType = ParameterType::PreferredOrientation;

    fn wrap(value: Orientation) -> ParamValue {
        ParamValue::Orientation(value)
    }

    fn unwrap(value: &ParamValue) -> Option<&Orientation> {
        match value {
            ParamValue::Orientation(o) => Some(o),
            _ => None,
        }
    }
}

// ============================================================================
// Stores
// ============================================================================

/// Parameters owned by one anchor or one key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    params: BTreeMap<ParameterType, Parameter>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ty: ParameterType) -> Option<&Parameter> {
        self.params.get(&ty)
    }

    pub(crate) fn insert(&mut self, param: Parameter) {
        self.params.insert(param.ty(), param);
    }

    /// Get the parameter, creating it with `factory` when missing
    pub(crate) fn get_or_create(&mut self, ty: ParameterType, factory: ParameterFactory) -> &mut Parameter {
        self.params.entry(ty).or_insert_with(factory)
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(ParameterType) -> bool) {
        self.params.retain(|ty, _| keep(*ty));
    }

    pub fn contains(&self, ty: ParameterType) -> bool {
        self.params.contains_key(&ty)
    }

    pub fn types(&self) -> impl Iterator<Item = ParameterType> + '_ {
        self.params.keys().copied()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.params.values_mut()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Read view over the parameters visible to one key: the anchor's shared
/// store plus the key's own store
#[derive(Debug, Clone, Copy)]
pub struct ParameterSet<'a> {
    anchorage: &'a ParameterStore,
    anchored: Option<&'a ParameterStore>,
}

impl<'a> ParameterSet<'a> {
    pub fn new(anchorage: &'a ParameterStore, anchored: Option<&'a ParameterStore>) -> Self {
        ParameterSet { anchorage, anchored }
    }

    pub fn get(&self, ty: ParameterType) -> Option<&'a Parameter> {
        match ty.kind() {
            ParameterKind::Anchorage => self.anchorage.get(ty),
            ParameterKind::Anchored => self.anchored?.get(ty),
        }
    }

    /// Typed value lookup
    pub fn value<P: ParameterSpec>(&self) -> Option<&'a P::Value> {
        self.get(P::TYPE)?.value().and_then(P::unwrap)
    }

    /// First mandatory parameter among `required` that has no value
    pub fn missing_mandatory(&self, required: &[ParameterType]) -> Option<ParameterType> {
        required
            .iter()
            .copied()
            .filter(|ty| !ty.is_optional())
            .find(|ty| self.get(*ty).and_then(Parameter::value).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;
    use glam::dvec2;

    #[test]
    fn kinds_and_optionality() {
        assert_eq!(AnchorageReferenceGeometry::TYPE.kind(), ParameterKind::Anchorage);
        assert_eq!(AnchoredReferencePoint::TYPE.kind(), ParameterKind::Anchored);
        assert!(PreferredOrientation::TYPE.is_optional());
        assert!(!AnchoredReferencePoint::TYPE.is_optional());
    }

    #[test]
    fn set_reports_change_only_once() {
        let mut p = AnchoredReferencePoint::create();
        let v = Some(AnchoredReferencePoint::wrap(dvec2(1.0, 2.0)));
        assert_eq!(p.set(v.clone()), Ok(true));
        assert_eq!(p.set(v), Ok(false));
    }

    #[test]
    fn bound_parameter_refuses_manual_set() {
        let mut p = AnchorageReferenceGeometry::create();
        assert!(p.is_bound());
        assert_eq!(
            p.set(None),
            Err(AnchorError::ParameterBound {
                ty: ParameterType::AnchorageReferenceGeometry
            })
        );
        assert_eq!(p.unbind(), Some(Binding::AnchorageGeometry));
        assert_eq!(p.set(None), Ok(false));
    }

    #[test]
    fn binding_type_is_checked() {
        let mut p = PreferredOrientation::create();
        assert!(matches!(
            p.bind(Binding::AnchoredCenter),
            Err(AnchorError::BindingTypeMismatch { .. })
        ));
    }

    #[test]
    fn refresh_tracks_source_geometry() {
        let mut scene = SceneGraph::new();
        let root = scene.add_root();
        let shape = scene.add_shape(root, Geometry::rect(0.0, 0.0, 10.0, 10.0)).unwrap();

        let mut p = AnchorageReferenceGeometry::create();
        assert!(p.refresh(&scene, Some(shape), None));
        assert!(!p.refresh(&scene, Some(shape), None));

        scene.set_geometry(shape, Some(Geometry::rect(0.0, 0.0, 20.0, 10.0))).unwrap();
        assert!(p.refresh(&scene, Some(shape), None));
        assert_eq!(
            p.get::<AnchorageReferenceGeometry>(),
            Some(&Geometry::rect(0.0, 0.0, 20.0, 10.0))
        );
        assert_eq!(p.get::<AnchoredReferencePoint>(), None);
    }

    #[test]
    fn anchored_center_binding_uses_bounds_center() {
        let mut scene = SceneGraph::new();
        let root = scene.add_root();
        let shape = scene.add_shape(root, Geometry::rect(0.0, 0.0, 10.0, 4.0)).unwrap();
        assert_eq!(
            Binding::AnchoredCenter.evaluate(&scene, None, Some(shape)),
            Some(ParamValue::Point(dvec2(5.0, 2.0)))
        );
    }

    #[test]
    fn set_routes_by_kind() {
        let mut shared = ParameterStore::new();
        let mut own = ParameterStore::new();
        shared.insert(AnchorageReferenceGeometry::create());
        let mut point = AnchoredReferencePoint::create();
        point.set(Some(ParamValue::Point(dvec2(3.0, 4.0)))).unwrap();
        own.insert(point);

        let set = ParameterSet::new(&shared, Some(&own));
        assert_eq!(set.value::<AnchoredReferencePoint>(), Some(&dvec2(3.0, 4.0)));
        assert_eq!(
            set.missing_mandatory(&[
                ParameterType::AnchorageReferenceGeometry,
                ParameterType::AnchoredReferencePoint,
                ParameterType::PreferredOrientation,
            ]),
            Some(ParameterType::AnchorageReferenceGeometry)
        );

        let without_key = ParameterSet::new(&shared, None);
        assert_eq!(without_key.value::<AnchoredReferencePoint>(), None);
    }
}
