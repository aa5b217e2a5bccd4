// Controller handler methods
//
// A handler is a plain function or method taking the controller by
// reference followed by up to ten arguments:
//
//     fn show(&self, id: i64, session: Session) -> HttpResponse
//
// `Handler` is implemented for every such function. It reports the declared
// argument types, which drive route compilation, and calls the function
// with type-erased arguments. The arguments are downcast back per position,
// so the call itself stays monomorphized; only storage goes through a
// vtable, via `ErasedHandler`.

use crate::annotation::Annotation;
use crate::extractors::Value;
use girder_core::TypeInfo;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Arguments assembled for one call, in declaration order.
pub type Arguments = Vec<Option<Value>>;

/// Why a set of arguments could not be applied to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// The request supplied nothing for a parameter that needs a value.
    Missing { index: usize, expected: &'static str },
    /// A value of the wrong type reached the handler.
    Mismatch { index: usize, expected: &'static str },
    /// Wrong number of arguments.
    Arity { expected: usize, actual: usize },
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { index, expected } => {
                write!(f, "no value for argument {} ({})", index, expected)
            }
            Self::Mismatch { index, expected } => {
                write!(f, "argument {} is not a {}", index, expected)
            }
            Self::Arity { expected, actual } => {
                write!(f, "expected {} arguments, got {}", expected, actual)
            }
        }
    }
}

/// A function callable with a controller and type-erased arguments.
pub trait Handler<T, Args>: Send + Sync + 'static {
    type Output;

    /// Declared types of the arguments after the controller.
    fn parameter_types() -> Vec<TypeInfo>;

    fn call(&self, target: &T, arguments: Arguments) -> Result<Self::Output, ArgumentError>;
}

fn take<A: 'static>(next: Option<(usize, Option<Value>)>, arity: usize) -> Result<A, ArgumentError> {
    let expected = std::any::type_name::<A>();
    match next {
        Some((index, Some(value))) => value
            .downcast::<A>()
            .map(|value| *value)
            .map_err(|_| ArgumentError::Mismatch { index, expected }),
        Some((index, None)) => Err(ArgumentError::Missing { index, expected }),
        None => Err(ArgumentError::Arity {
            expected: arity,
            actual: arity.saturating_sub(1),
        }),
    }
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_handler {
    ($($A:ident),*) => {
        impl<T, F, R, $($A,)*> Handler<T, ($($A,)*)> for F
        where
            F: Fn(&T, $($A),*) -> R + Send + Sync + 'static,
            $($A: Send + 'static,)*
        {
            type Output = R;

            fn parameter_types() -> Vec<TypeInfo> {
                vec![$(TypeInfo::of::<$A>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call(&self, target: &T, arguments: Arguments) -> Result<R, ArgumentError> {
                let expected = count!($($A)*);
                if arguments.len() != expected {
                    return Err(ArgumentError::Arity {
                        expected,
                        actual: arguments.len(),
                    });
                }

                let mut arguments = arguments.into_iter().enumerate();
                $(
                    let $A = take::<$A>(arguments.next(), expected)?;
                )*
                Ok(self(target, $($A),*))
            }
        }
    };
}

impl_handler!();
impl_handler!(A0);
impl_handler!(A0, A1);
impl_handler!(A0, A1, A2);
impl_handler!(A0, A1, A2, A3);
impl_handler!(A0, A1, A2, A3, A4);
impl_handler!(A0, A1, A2, A3, A4, A5);
impl_handler!(A0, A1, A2, A3, A4, A5, A6);
impl_handler!(A0, A1, A2, A3, A4, A5, A6, A7);
impl_handler!(A0, A1, A2, A3, A4, A5, A6, A7, A8);
impl_handler!(A0, A1, A2, A3, A4, A5, A6, A7, A8, A9);

/// Object-safe face of [`Handler`], for storage.
pub(crate) trait ErasedHandler<T, R>: Send + Sync {
    fn call(&self, target: &T, arguments: Arguments) -> Result<R, ArgumentError>;
}

struct HandlerWrapper<H, Args> {
    handler: H,
    _marker: PhantomData<fn() -> Args>,
}

impl<T, R, H, Args> ErasedHandler<T, R> for HandlerWrapper<H, Args>
where
    H: Handler<T, Args, Output = R>,
    Args: 'static,
{
    fn call(&self, target: &T, arguments: Arguments) -> Result<R, ArgumentError> {
        self.handler.call(target, arguments)
    }
}

/// A handler awaiting compilation, with its name and parameter annotations.
///
/// ```
/// use girder_binding::annotation::{Param, PathParam};
/// use girder_binding::HandlerMethod;
///
/// struct Articles;
///
/// impl Articles {
///     fn show(&self, id: i64, format: Option<String>) -> String {
///         format!("{} as {}", id, format.unwrap_or_default())
///     }
/// }
///
/// let method = HandlerMethod::new("Articles::show", Articles::show)
///     .annotate(0, PathParam::named("id"))
///     .annotate(1, Param::named("format"));
/// assert_eq!(method.parameter_types().len(), 2);
/// ```
pub struct HandlerMethod<T, R> {
    name: String,
    parameter_types: Vec<TypeInfo>,
    annotations: Vec<(usize, Arc<dyn Annotation>)>,
    handler: Arc<dyn ErasedHandler<T, R>>,
}

impl<T: 'static, R: 'static> HandlerMethod<T, R> {
    pub fn new<Args, H>(name: impl Into<String>, handler: H) -> Self
    where
        Args: 'static,
        H: Handler<T, Args, Output = R>,
    {
        Self {
            name: name.into(),
            parameter_types: H::parameter_types(),
            annotations: Vec::new(),
            handler: Arc::new(HandlerWrapper {
                handler,
                _marker: PhantomData,
            }),
        }
    }
}

impl<T, R> HandlerMethod<T, R> {
    /// Attach an annotation to the parameter at `index`, counting from the
    /// first argument after the controller.
    pub fn annotate(mut self, index: usize, annotation: impl Annotation) -> Self {
        self.annotations.push((index, Arc::new(annotation)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[TypeInfo] {
        &self.parameter_types
    }

    /// Annotations on the parameter at `index`, in attachment order.
    pub fn annotations(&self, index: usize) -> impl Iterator<Item = &Arc<dyn Annotation>> + '_ {
        self.annotations
            .iter()
            .filter(move |(i, _)| *i == index)
            .map(|(_, annotation)| annotation)
    }

    /// Index of the first annotation attached beyond the last parameter.
    pub(crate) fn stray_annotation(&self) -> Option<usize> {
        self.annotations
            .iter()
            .map(|(index, _)| *index)
            .find(|index| *index >= self.parameter_types.len())
    }

    pub(crate) fn into_parts(self) -> (String, Vec<TypeInfo>, Arc<dyn ErasedHandler<T, R>>) {
        (self.name, self.parameter_types, self.handler)
    }
}

impl<T, R> fmt::Debug for HandlerMethod<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("name", &self.name)
            .field("parameter_types", &self.parameter_types)
            .field("annotations", &self.annotations.len())
            .finish()
    }
}
