//! Route compilation.
//!
//! [`RouteCompiler::compile`] turns a [`HandlerMethod`] into a
//! [`ControllerMethodInvoker`] holding one extractor chain per parameter.
//! Every decision is made here, once per route:
//!
//! 1. Parameters of a framework type (`Context`, `Session`, `FlashScope`,
//!    `Validation`) bind statically.
//! 2. Otherwise the first annotation carrying an extractor factory builds
//!    one. `Param` or `Params` on an upload type is replaced by the matching
//!    upload extractor.
//! 3. At most one parameter may remain; it binds the request body.
//! 4. Validators whose type accepts the extractor output run before
//!    conversion, those accepting the declared type run after it.
//! 5. A field-bound extractor whose output differs from the declared type is
//!    adapted by wrapping it as optional or parsing its strings.
//!
//! Anything that cannot be resolved is a [`ConfigurationError`], so a bad
//! handler fails at startup rather than on its first request.

use crate::annotation::{Annotation, Param, Params};
use crate::error::{BindingResult, ConfigurationError, ConfigurationErrorKind};
use crate::extractors::{
    BodyAsExtractor, BoxedExtractor, OptionalWrapperExtractor, ParsingWrapperExtractor,
    ValidatingWrapperExtractor, static_extractor_for, upload_extractor_for,
};
use crate::handler::HandlerMethod;
use crate::invoker::ControllerMethodInvoker;
use crate::parsers::{ArrayParser, ParamParser, ParamParsers, ParseParam};
use girder_core::{Container, FileItem, InputStream, TypeInfo};
use girder_log::{debug, trace};
use girder_validation::Validator;
use serde::de::DeserializeOwned;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

type BodyFactory = Arc<dyn Fn() -> BoxedExtractor + Send + Sync>;
type OptionalFactory = Arc<dyn Fn(BoxedExtractor) -> BoxedExtractor + Send + Sync>;

/// Types the request body may be deserialized into.
#[derive(Clone, Default)]
pub struct BodyParsers {
    factories: HashMap<TypeId, BodyFactory>,
}

impl BodyParsers {
    /// Accept `B` and `Option<B>` as body parameters. An empty body binds
    /// `Option<B>` as `None`.
    pub fn register<B: DeserializeOwned + Send + 'static>(&mut self) {
        let required: BodyFactory =
            Arc::new(|| Box::new(BodyAsExtractor::<B>::new()) as BoxedExtractor);
        let optional: BodyFactory = Arc::new(|| {
            Box::new(OptionalWrapperExtractor::<B>::new(Box::new(
                BodyAsExtractor::<B>::new(),
            ))) as BoxedExtractor
        });
        self.factories.insert(TypeId::of::<B>(), required);
        self.factories.insert(TypeId::of::<Option<B>>(), optional);
    }

    pub fn contains(&self, declared: &TypeInfo) -> bool {
        self.factories.contains_key(&declared.id())
    }

    pub(crate) fn extractor_for(&self, declared: &TypeInfo) -> Option<BoxedExtractor> {
        self.factories.get(&declared.id()).map(|build| build())
    }
}

impl fmt::Debug for BodyParsers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyParsers")
            .field("types", &self.factories.len())
            .finish()
    }
}

/// `Option<X>` types a field-bound extractor of `X` may bind to.
#[derive(Clone)]
pub struct OptionalTypes {
    wrappers: HashMap<TypeId, (TypeInfo, OptionalFactory)>,
}

impl Default for OptionalTypes {
    fn default() -> Self {
        let mut types = Self {
            wrappers: HashMap::new(),
        };
        types.register::<String>();
        types.register::<Vec<String>>();
        types.register::<FileItem>();
        types.register::<Vec<FileItem>>();
        types.register::<PathBuf>();
        types.register::<Vec<PathBuf>>();
        types.register::<InputStream>();
        types.register::<Vec<InputStream>>();
        types
    }
}

impl OptionalTypes {
    pub fn register<X: Send + 'static>(&mut self) {
        let wrap: OptionalFactory = Arc::new(|inner| {
            Box::new(OptionalWrapperExtractor::<X>::new(inner)) as BoxedExtractor
        });
        self.wrappers
            .insert(TypeId::of::<Option<X>>(), (TypeInfo::of::<X>(), wrap));
    }

    /// Whether `declared` is a registered `Option<X>` with `X == extracted`.
    pub fn applies(&self, declared: &TypeInfo, extracted: &TypeInfo) -> bool {
        self.wrappers
            .get(&declared.id())
            .is_some_and(|(inner, _)| inner == extracted)
    }

    fn wrap(&self, declared: &TypeInfo, extractor: BoxedExtractor) -> BoxedExtractor {
        match self.wrappers.get(&declared.id()) {
            Some((_, wrap)) => wrap(extractor),
            None => extractor,
        }
    }
}

impl fmt::Debug for OptionalTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner: Vec<_> = self.wrappers.values().map(|(inner, _)| inner.name()).collect();
        f.debug_struct("OptionalTypes").field("types", &inner).finish()
    }
}

/// Compiles handler methods into invokers.
///
/// ```
/// use girder_binding::annotation::{Param, PathParam};
/// use girder_binding::{HandlerMethod, RouteCompiler};
///
/// struct Users;
///
/// impl Users {
///     fn show(&self, id: u64, verbose: bool) -> String {
///         format!("user {} verbose={}", id, verbose)
///     }
/// }
///
/// let compiler = RouteCompiler::new();
/// let invoker = compiler
///     .compile(
///         HandlerMethod::new("Users::show", Users::show)
///             .annotate(0, PathParam::named("id"))
///             .annotate(1, Param::named("verbose")),
///     )
///     .unwrap();
/// assert_eq!(invoker.arity(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteCompiler {
    parsers: ParamParsers,
    bodies: BodyParsers,
    optionals: OptionalTypes,
    container: Container,
}

impl RouteCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `container` as the parent scope for resolved extractor factories.
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn parsers(&self) -> &ParamParsers {
        &self.parsers
    }

    pub fn parsers_mut(&mut self) -> &mut ParamParsers {
        &mut self.parsers
    }

    pub fn register_parser<P: ParamParser + 'static>(&mut self, parser: P) -> &mut Self {
        self.parsers.register(parser);
        self
    }

    pub fn register_array_parser<P: ArrayParser + 'static>(&mut self, parser: P) -> &mut Self {
        self.parsers.register_array(parser);
        self
    }

    /// Register the scalar, optional and array parsers of `T`.
    pub fn register_param_type<T: ParseParam + Default>(&mut self) -> &mut Self {
        self.parsers.register_type::<T>();
        self
    }

    pub fn register_body<B: DeserializeOwned + Send + 'static>(&mut self) -> &mut Self {
        self.bodies.register::<B>();
        self
    }

    pub fn register_optional<X: Send + 'static>(&mut self) -> &mut Self {
        self.optionals.register::<X>();
        self
    }

    pub fn compile<T: 'static, R: 'static>(
        &self,
        method: HandlerMethod<T, R>,
    ) -> BindingResult<ControllerMethodInvoker<T, R>> {
        let name = method.name().to_string();
        let count = method.parameter_types().len();

        if let Some(index) = method.stray_annotation() {
            return Err(ConfigurationError::new(
                name,
                index,
                ConfigurationErrorKind::NoSuchParameter { count },
            ));
        }

        let mut slots = Vec::with_capacity(count);
        for (index, declared) in method.parameter_types().iter().enumerate() {
            let annotations: Vec<_> = method.annotations(index).cloned().collect();
            slots.push(self.resolve(&name, index, declared, &annotations)?);
        }

        let unresolved: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect();
        if let &[first, second, ..] = unresolved.as_slice() {
            return Err(ConfigurationError::new(
                name,
                second,
                ConfigurationErrorKind::AmbiguousBody { first },
            ));
        }

        let mut extractors = Vec::with_capacity(count);
        for (index, slot) in slots.into_iter().enumerate() {
            let declared = method.parameter_types()[index];
            let extractor = match slot {
                Some(extractor) => extractor,
                None => {
                    trace!(target: "girder::binding", { method = name, index = index }, "parameter binds the request body");
                    self.bodies.extractor_for(&declared).ok_or_else(|| {
                        ConfigurationError::new(
                            name.clone(),
                            index,
                            ConfigurationErrorKind::NoBodyParser(declared),
                        )
                    })?
                }
            };

            let validators: Vec<_> = method
                .annotations(index)
                .filter_map(|annotation| annotation.validator())
                .collect();
            extractors.push(self.finish(&name, index, &declared, extractor, validators)?);
        }

        debug!(target: "girder::binding", { method = name, parameters = count }, "compiled handler");
        let (name, _, handler) = method.into_parts();
        Ok(ControllerMethodInvoker::new(name, extractors, handler))
    }

    /// Steps 1 and 2: a static or annotation-built extractor, if any.
    fn resolve(
        &self,
        method: &str,
        index: usize,
        declared: &TypeInfo,
        annotations: &[Arc<dyn Annotation>],
    ) -> BindingResult<Option<BoxedExtractor>> {
        if let Some(extractor) = static_extractor_for(declared) {
            trace!(target: "girder::binding", { index = index, parameter_type = declared }, "static extractor");
            return Ok(Some(extractor));
        }

        for annotation in annotations {
            let Some(factory) = annotation.with_extractor() else {
                continue;
            };
            let (strategy, extractor) = factory
                .build(annotation, declared, &self.container)
                .map_err(|reason| {
                    ConfigurationError::new(method, index, ConfigurationErrorKind::Factory(reason))
                })?;
            trace!(target: "girder::binding", { index = index, strategy = strategy }, "annotation extractor");

            if annotation.is::<Param>() || annotation.is::<Params>() {
                let upload = extractor
                    .field_name()
                    .and_then(|field| upload_extractor_for(field, declared));
                if let Some(upload) = upload {
                    trace!(target: "girder::binding", { index = index, parameter_type = declared }, "parameter binds an upload");
                    return Ok(Some(upload));
                }
            }
            return Ok(Some(extractor));
        }

        Ok(None)
    }

    /// Steps 4 and 5: validation and type adaptation.
    fn finish(
        &self,
        method: &str,
        index: usize,
        declared: &TypeInfo,
        extractor: BoxedExtractor,
        validators: Vec<Arc<dyn Validator>>,
    ) -> BindingResult<BoxedExtractor> {
        let extracted = extractor.extracted_type();
        let mut before = Vec::new();
        let mut after = Vec::new();
        for validator in validators {
            let validated = validator.validated_type();
            if validated.is_assignable_from(&extracted) {
                before.push(validator);
            } else if validated.is_assignable_from(declared) {
                after.push(validator);
            } else {
                return Err(ConfigurationError::new(
                    method,
                    index,
                    ConfigurationErrorKind::ValidatorMismatch {
                        validator: validator.name(),
                        validated,
                        extracted,
                        declared: *declared,
                    },
                ));
            }
        }

        let mut extractor = extractor;
        if !before.is_empty() {
            extractor = Box::new(ValidatingWrapperExtractor::new(extractor, before));
        }
        extractor = self.adapt(method, index, declared, extractor)?;
        if !after.is_empty() {
            extractor = Box::new(ValidatingWrapperExtractor::new(extractor, after));
        }
        Ok(extractor)
    }

    fn adapt(
        &self,
        method: &str,
        index: usize,
        declared: &TypeInfo,
        extractor: BoxedExtractor,
    ) -> BindingResult<BoxedExtractor> {
        let extracted = extractor.extracted_type();
        if extracted == *declared || extractor.field_name().is_none() {
            return Ok(extractor);
        }

        if self.optionals.applies(declared, &extracted) {
            return Ok(self.optionals.wrap(declared, extractor));
        }

        let error = |kind| ConfigurationError::new(method, index, kind);
        if extracted.is::<String>() {
            let parser = self.parsers.scalar(declared).ok_or_else(|| {
                error(ConfigurationErrorKind::NoParser {
                    extracted,
                    declared: *declared,
                })
            })?;
            Ok(Box::new(ParsingWrapperExtractor::scalar(extractor, parser)))
        } else if extracted.is::<Vec<String>>() {
            let parser = self.parsers.array(declared).ok_or_else(|| {
                error(ConfigurationErrorKind::NoParser {
                    extracted,
                    declared: *declared,
                })
            })?;
            Ok(Box::new(ParsingWrapperExtractor::array(extractor, parser)))
        } else {
            Err(error(ConfigurationErrorKind::TypeMismatch {
                extracted,
                declared: *declared,
            }))
        }
    }
}
