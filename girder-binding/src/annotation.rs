//! Parameter annotations.
//!
//! Handlers declare where each argument comes from by attaching annotations
//! to parameter positions. An annotation may name an extractor (through
//! [`Annotation::with_extractor`]) and may attach a validator (through
//! [`Annotation::validator`]).
//!
//! An [`ExtractorFactory`] describes how to build the extractor. It can carry
//! up to four strategies and the first one present wins, in this order:
//!
//! 1. a plain constructor taking nothing,
//! 2. a constructor taking the annotation,
//! 3. a constructor taking the declared parameter type,
//! 4. resolution against a child [`Container`] scope holding
//!    [`BoundAnnotation`] and [`BoundParameterType`].
//!
//! The cheaper strategies never touch the container.

use crate::extractors::{
    AttributeExtractor, BoxedExtractor, HeaderExtractor, HeadersExtractor, ParamExtractor,
    ParamsExtractor, PathParamExtractor, SessionParamExtractor,
};
use girder_core::{Container, TypeInfo};
use girder_log::trace;
use girder_validation::Validator;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Metadata attached to one handler parameter.
pub trait Annotation: Any + Send + Sync + fmt::Debug {
    /// The extractor this annotation binds the parameter with.
    fn with_extractor(&self) -> Option<ExtractorFactory> {
        None
    }

    /// The validator this annotation applies to the parameter.
    fn validator(&self) -> Option<Arc<dyn Validator>> {
        None
    }
}

impl dyn Annotation {
    pub fn is<A: Annotation>(&self) -> bool {
        self.downcast_ref::<A>().is_some()
    }

    pub fn downcast_ref<A: Annotation>(&self) -> Option<&A> {
        let any: &dyn Any = self;
        any.downcast_ref()
    }
}

type PlainFn = Arc<dyn Fn() -> BoxedExtractor + Send + Sync>;
type AnnotationFn = Arc<dyn Fn(&dyn Annotation) -> Result<BoxedExtractor, String> + Send + Sync>;
type ParameterTypeFn = Arc<dyn Fn(&TypeInfo) -> BoxedExtractor + Send + Sync>;
type ResolvedFn =
    Arc<dyn Fn(&Container) -> Result<BoxedExtractor, girder_core::Error> + Send + Sync>;

/// Which [`ExtractorFactory`] strategy built an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Plain,
    Annotation,
    ParameterType,
    Resolved,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plain => "plain",
            Self::Annotation => "annotation",
            Self::ParameterType => "parameter type",
            Self::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// How to build an extractor for an annotated parameter.
#[derive(Clone, Default)]
pub struct ExtractorFactory {
    plain: Option<PlainFn>,
    from_annotation: Option<AnnotationFn>,
    from_parameter_type: Option<ParameterTypeFn>,
    resolved: Option<ResolvedFn>,
}

impl ExtractorFactory {
    pub fn plain<F>(build: F) -> Self
    where
        F: Fn() -> BoxedExtractor + Send + Sync + 'static,
    {
        Self::default().with_plain(build)
    }

    pub fn from_annotation<F>(build: F) -> Self
    where
        F: Fn(&dyn Annotation) -> Result<BoxedExtractor, String> + Send + Sync + 'static,
    {
        Self::default().with_from_annotation(build)
    }

    pub fn from_parameter_type<F>(build: F) -> Self
    where
        F: Fn(&TypeInfo) -> BoxedExtractor + Send + Sync + 'static,
    {
        Self::default().with_from_parameter_type(build)
    }

    pub fn resolved<F>(build: F) -> Self
    where
        F: Fn(&Container) -> Result<BoxedExtractor, girder_core::Error> + Send + Sync + 'static,
    {
        Self::default().with_resolved(build)
    }

    pub fn with_plain<F>(mut self, build: F) -> Self
    where
        F: Fn() -> BoxedExtractor + Send + Sync + 'static,
    {
        self.plain = Some(Arc::new(build));
        self
    }

    pub fn with_from_annotation<F>(mut self, build: F) -> Self
    where
        F: Fn(&dyn Annotation) -> Result<BoxedExtractor, String> + Send + Sync + 'static,
    {
        self.from_annotation = Some(Arc::new(build));
        self
    }

    pub fn with_from_parameter_type<F>(mut self, build: F) -> Self
    where
        F: Fn(&TypeInfo) -> BoxedExtractor + Send + Sync + 'static,
    {
        self.from_parameter_type = Some(Arc::new(build));
        self
    }

    pub fn with_resolved<F>(mut self, build: F) -> Self
    where
        F: Fn(&Container) -> Result<BoxedExtractor, girder_core::Error> + Send + Sync + 'static,
    {
        self.resolved = Some(Arc::new(build));
        self
    }

    /// Build with the first strategy present.
    pub fn build(
        &self,
        annotation: &Arc<dyn Annotation>,
        declared: &TypeInfo,
        container: &Container,
    ) -> Result<(Strategy, BoxedExtractor), String> {
        if let Some(ref build) = self.plain {
            return Ok((Strategy::Plain, build()));
        }
        if let Some(ref build) = self.from_annotation {
            return build(annotation.as_ref()).map(|e| (Strategy::Annotation, e));
        }
        if let Some(ref build) = self.from_parameter_type {
            return Ok((Strategy::ParameterType, build(declared)));
        }
        if let Some(ref build) = self.resolved {
            let scope = container.child();
            scope.register(BoundAnnotation(annotation.clone()));
            scope.register(BoundParameterType(*declared));
            trace!(target: "girder::binding", { parameter_type = declared }, "resolving extractor from child scope");
            return build(&scope)
                .map(|e| (Strategy::Resolved, e))
                .map_err(|e| e.to_string());
        }
        Err("extractor factory has no strategy".to_string())
    }
}

impl fmt::Debug for ExtractorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorFactory")
            .field("plain", &self.plain.is_some())
            .field("from_annotation", &self.from_annotation.is_some())
            .field("from_parameter_type", &self.from_parameter_type.is_some())
            .field("resolved", &self.resolved.is_some())
            .finish()
    }
}

/// The annotation being resolved, as seen from a child scope.
#[derive(Debug, Clone)]
pub struct BoundAnnotation(pub Arc<dyn Annotation>);

impl BoundAnnotation {
    pub fn get<A: Annotation>(&self) -> Option<&A> {
        self.0.downcast_ref::<A>()
    }
}

/// The declared type of the parameter being resolved.
#[derive(Debug, Clone, Copy)]
pub struct BoundParameterType(pub TypeInfo);

macro_rules! field_annotation {
    ($(#[$doc:meta])* $name:ident => $extractor:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub name: String,
        }

        impl $name {
            pub fn named(name: impl Into<String>) -> Self {
                Self { name: name.into() }
            }
        }

        impl Annotation for $name {
            fn with_extractor(&self) -> Option<ExtractorFactory> {
                Some(ExtractorFactory::from_annotation(|annotation| {
                    annotation
                        .downcast_ref::<$name>()
                        .map(|a| Box::new($extractor::new(a.name.clone())) as BoxedExtractor)
                        .ok_or_else(|| format!("expected a {} annotation", stringify!($name)))
                }))
            }
        }
    };
}

field_annotation!(
    /// Bind a path parameter.
    PathParam => PathParamExtractor
);

field_annotation!(
    /// Bind the first value of a query or form parameter, or an upload when
    /// the parameter is declared as one.
    Param => ParamExtractor
);

field_annotation!(
    /// Bind every value of a query or form parameter, or every upload.
    Params => ParamsExtractor
);

field_annotation!(
    /// Bind the first value of a header.
    Header => HeaderExtractor
);

field_annotation!(
    /// Bind every value of a header.
    Headers => HeadersExtractor
);

field_annotation!(
    /// Bind a session value.
    SessionParam => SessionParamExtractor
);

/// Bind a typed request attribute.
pub struct Attribute<T> {
    pub name: String,
    optional: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + Sync + 'static> Attribute<T> {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            _marker: PhantomData,
        }
    }

    /// Bind as `Option<T>`, with `None` when the attribute is missing.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl<T> fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .field("optional", &self.optional)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Annotation for Attribute<T> {
    fn with_extractor(&self) -> Option<ExtractorFactory> {
        let name = self.name.clone();
        let optional = self.optional;
        Some(ExtractorFactory::plain(move || {
            let extractor: BoxedExtractor = if optional {
                Box::new(AttributeExtractor::<T>::optional(name.clone()))
            } else {
                Box::new(AttributeExtractor::<T>::new(name.clone()))
            };
            extractor
        }))
    }
}

/// Attach a validator to a parameter.
#[derive(Debug, Clone)]
pub struct Validate(pub Arc<dyn Validator>);

impl Validate {
    pub fn with<V: Validator + 'static>(validator: V) -> Self {
        Self(Arc::new(validator))
    }
}

impl Annotation for Validate {
    fn validator(&self) -> Option<Arc<dyn Validator>> {
        Some(self.0.clone())
    }
}
