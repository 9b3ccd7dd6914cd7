//! The slice of the external scene graph this crate consumes: an addressable
//! tree of named items whose parameters are typed value cells reachable by
//! stable paths.
//!
//! Parameters are referenced by serialized path rather than by pointer so
//! poses and views survive a save/load boundary; the lookup is re-run
//! against a freshly constructed scene on load.

use crate::error::Result;
use crate::math::Xfo;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

pub const GLOBAL_XFO_PARAM: &str = "GlobalXfo";
pub const VISIBLE_PARAM: &str = "Visible";

/// Ordered name segments from the scene root down to a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamPath(pub Vec<String>);

impl ParamPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Map key for this path. Identical paths always produce identical keys,
    /// which is what makes path-based lookup after reload possible.
    pub fn key(&self) -> String {
        serde_json::to_string(&self.0).expect("string segments always serialize")
    }

    pub fn parse_key(key: &str) -> Result<Self> {
        let segments: Vec<String> = serde_json::from_str(key)?;
        Ok(Self(segments))
    }

    /// Path of the item owning this parameter (everything but the final,
    /// parameter-name segment).
    pub fn owner_path(&self) -> &[String] {
        let len = self.0.len();
        &self.0[..len.saturating_sub(1)]
    }

    pub fn param_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Xfo,
    Bool,
    Number,
    Str,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Xfo => "xfo",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Str => "string",
        }
    }
}

/// Tagged value union stored in poses and carried by parameter cells.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Xfo(Xfo),
    Bool(bool),
    Number(f64),
    Str(String),
}

impl ParamValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ParamValue::Xfo(_) => ValueKind::Xfo,
            ParamValue::Bool(_) => ValueKind::Bool,
            ParamValue::Number(_) => ValueKind::Number,
            ParamValue::Str(_) => ValueKind::Str,
        }
    }

    /// Discrete values cannot be interpolated; transitions snap them to the
    /// end value on the first step instead.
    pub fn is_discrete(&self) -> bool {
        matches!(self, ParamValue::Bool(_) | ParamValue::Str(_))
    }

    /// Interpolates continuous values. Discrete values return the end value
    /// unchanged; the animation decides when to apply it.
    pub fn lerp(&self, end: &ParamValue, t: f32) -> ParamValue {
        match (self, end) {
            (ParamValue::Xfo(a), ParamValue::Xfo(b)) => ParamValue::Xfo(a.lerp(b, t)),
            (ParamValue::Number(a), ParamValue::Number(b)) => {
                ParamValue::Number(a + (b - a) * f64::from(t))
            }
            _ => end.clone(),
        }
    }
}

/// Live value cell at a stable path.
#[derive(Debug)]
pub struct Parameter {
    path: ParamPath,
    value: ParamValue,
}

pub type ParamRef = Rc<RefCell<Parameter>>;

impl Parameter {
    pub fn new(path: ParamPath, value: ParamValue) -> ParamRef {
        Rc::new(RefCell::new(Self { path, value }))
    }

    pub fn path(&self) -> &ParamPath {
        &self.path
    }

    pub fn key(&self) -> String {
        self.path.key()
    }

    pub fn value(&self) -> ParamValue {
        self.value.clone()
    }

    pub fn set_value(&mut self, value: ParamValue) {
        self.value = value;
    }
}

/// Named node in the parameter tree. Every item carries a global transform
/// and a visibility flag; hosts can hang extra typed parameters off it.
#[derive(Debug)]
pub struct TreeItem {
    name: String,
    path: Vec<String>,
    global_xfo: ParamRef,
    visible: ParamRef,
    extra_params: Vec<ParamRef>,
    children: Vec<ItemRef>,
}

pub type ItemRef = Rc<RefCell<TreeItem>>;

impl TreeItem {
    fn new(path: Vec<String>) -> ItemRef {
        let name = path.last().cloned().unwrap_or_default();
        let mut xfo_path = path.clone();
        xfo_path.push(GLOBAL_XFO_PARAM.to_string());
        let mut visible_path = path.clone();
        visible_path.push(VISIBLE_PARAM.to_string());
        Rc::new(RefCell::new(Self {
            name,
            path,
            global_xfo: Parameter::new(ParamPath::new(xfo_path), ParamValue::Xfo(Xfo::default())),
            visible: Parameter::new(ParamPath::new(visible_path), ParamValue::Bool(true)),
            extra_params: Vec::new(),
            children: Vec::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn global_xfo_param(&self) -> ParamRef {
        Rc::clone(&self.global_xfo)
    }

    pub fn visible_param(&self) -> ParamRef {
        Rc::clone(&self.visible)
    }

    pub fn global_xfo(&self) -> Xfo {
        match self.global_xfo.borrow().value() {
            ParamValue::Xfo(xfo) => xfo,
            _ => Xfo::default(),
        }
    }

    pub fn set_global_xfo(&self, xfo: Xfo) {
        self.global_xfo.borrow_mut().set_value(ParamValue::Xfo(xfo));
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.visible.borrow().value(), ParamValue::Bool(true))
    }

    pub fn add_param(&mut self, name: &str, value: ParamValue) -> ParamRef {
        let mut path = self.path.clone();
        path.push(name.to_string());
        let param = Parameter::new(ParamPath::new(path), value);
        self.extra_params.push(Rc::clone(&param));
        param
    }

    pub fn children(&self) -> &[ItemRef] {
        &self.children
    }

    fn find_param(&self, name: &str) -> Option<ParamRef> {
        match name {
            GLOBAL_XFO_PARAM => Some(Rc::clone(&self.global_xfo)),
            VISIBLE_PARAM => Some(Rc::clone(&self.visible)),
            _ => self
                .extra_params
                .iter()
                .find(|p| p.borrow().path().param_name() == Some(name))
                .map(Rc::clone),
        }
    }
}

/// Owns the item tree and resolves persisted paths back to live handles.
#[derive(Debug, Default)]
pub struct SceneGraph {
    roots: Vec<ItemRef>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, name: &str) -> ItemRef {
        let item = TreeItem::new(vec![name.to_string()]);
        self.roots.push(Rc::clone(&item));
        item
    }

    pub fn add_child(&mut self, parent: &ItemRef, name: &str) -> ItemRef {
        let mut path = parent.borrow().path.clone();
        path.push(name.to_string());
        let item = TreeItem::new(path);
        parent.borrow_mut().children.push(Rc::clone(&item));
        item
    }

    pub fn roots(&self) -> &[ItemRef] {
        &self.roots
    }

    pub fn clear(&mut self) {
        self.roots.clear();
    }

    pub fn resolve_item(&self, path: &[String]) -> Option<ItemRef> {
        let (first, rest) = path.split_first()?;
        let mut current = self.roots.iter().find(|r| r.borrow().name == *first).map(Rc::clone)?;
        for segment in rest {
            let next = current
                .borrow()
                .children
                .iter()
                .find(|c| c.borrow().name == *segment)
                .map(Rc::clone)?;
            current = next;
        }
        Some(current)
    }

    pub fn resolve_param(&self, path: &ParamPath) -> Option<ParamRef> {
        let name = path.param_name()?;
        let item = self.resolve_item(path.owner_path())?;
        let param = item.borrow().find_param(name);
        param
    }
}
