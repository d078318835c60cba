use core::fmt;
use std::sync::Arc;

use crate::info::MemberType;
use crate::value::{DynamicObject, Value};

// -----------------------------------------------------------------------------
// ConstructorInfo

/// Body of a constructor.
///
/// Receives a freshly allocated instance whose members hold their default
/// values, and the positional arguments.
pub type ConstructorFn =
    Arc<dyn Fn(&mut DynamicObject, Vec<Value>) -> Result<(), String> + Send + Sync>;

/// A constructor, optionally annotated with the members its parameters
/// initialise.
///
/// The annotation is a comma separated list of member names, one per
/// parameter, in parameter order. A type whose constructor carries a valid
/// annotation is written as its constructor arguments instead of its
/// member list.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::ConstructorInfo;
///
/// let ctor = ConstructorInfo::assigning("x, y");
/// assert_eq!(ctor.parameter_names(), ["x", "y"]);
/// assert_eq!(ctor.arity(), 2);
/// ```
#[derive(Clone)]
pub struct ConstructorInfo {
    params: Vec<String>,
    arity: usize,
    body: ConstructorFn,
}

impl ConstructorInfo {
    /// Creates an unannotated constructor.
    pub fn new(
        arity: usize,
        body: impl Fn(&mut DynamicObject, Vec<Value>) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            params: Vec::new(),
            arity,
            body: Arc::new(body),
        }
    }

    /// Creates a constructor annotated with `names`.
    pub fn annotated(
        names: &str,
        arity: usize,
        body: impl Fn(&mut DynamicObject, Vec<Value>) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            params: parse_names(names),
            arity,
            body: Arc::new(body),
        }
    }

    /// Creates an annotated constructor that stores every argument in the
    /// member of the same name.
    pub fn assigning(names: &str) -> Self {
        let params = parse_names(names);
        let targets = params.clone();
        Self {
            arity: params.len(),
            params,
            body: Arc::new(move |object, args| {
                for (name, value) in targets.iter().zip(args) {
                    object.set(name.as_str(), value);
                }
                Ok(())
            }),
        }
    }

    /// Member names from the annotation, empty when unannotated.
    #[inline]
    pub fn parameter_names(&self) -> &[String] {
        &self.params
    }

    /// Number of parameters the body expects.
    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Runs the body on `target`.
    pub fn invoke(&self, target: &mut DynamicObject, args: Vec<Value>) -> Result<(), String> {
        if args.len() != self.arity {
            return Err(format!("expected {} arguments, got {}", self.arity, args.len()));
        }
        (self.body)(target, args)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("params", &self.params)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

fn parse_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect()
}

// -----------------------------------------------------------------------------
// MethodInfo

/// Body of a method.
pub type MethodFn = Arc<dyn Fn(&mut DynamicObject, Vec<Value>) -> Result<(), String> + Send + Sync>;

/// An instance method, looked up by name and parameter types.
///
/// Collections without a list contract are filled through a single
/// argument `add` method.
#[derive(Clone)]
pub struct MethodInfo {
    name: String,
    params: Vec<MemberType>,
    body: MethodFn,
}

impl MethodInfo {
    pub fn new(
        name: impl Into<String>,
        params: Vec<MemberType>,
        body: impl Fn(&mut DynamicObject, Vec<Value>) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body: Arc::new(body),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[MemberType] {
        &self.params
    }

    /// Runs the method on `target`.
    pub fn invoke(&self, target: &mut DynamicObject, args: Vec<Value>) -> Result<(), String> {
        if args.len() != self.params.len() {
            return Err(format!(
                "`{}` expects {} arguments, got {}",
                self.name,
                self.params.len(),
                args.len()
            ));
        }
        (self.body)(target, args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
