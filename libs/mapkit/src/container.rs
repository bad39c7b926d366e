//! Dependency container used at the composition root.
//!
//! A capability is any `'static` type, usually a trait object (`dyn Trace`)
//! or a concrete service struct. Every binding hands out `Arc<T>`:
//!
//! - **transient**: the producer runs on every resolution,
//! - **singleton**: the producer runs once, on first resolution,
//! - **instance**: a pre-built value registered with [`Container::register_instance`].
//!
//! Producers receive a [`Resolver`] to pull their own dependencies. The
//! resolver carries the chain of capabilities being built, which is how
//! cycles are reported instead of overflowing the stack. The chain is also
//! kept per thread, so a producer that goes back through the container
//! itself (via [`Resolver::container`] or a captured handle) still sees it.
//!
//! ```rust,ignore
//! let container = Container::new();
//! container.register_instance::<dyn Trace>(Arc::new(TracingTrace))?;
//! container.register_singleton(|r| Ok(Arc::new(TileController::new(r.resolve()?))))?;
//! let tiles: Arc<TileController> = container.resolve()?;
//! ```

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;

pub use mapkit_bootstrap::DuplicatePolicy;

type Erased = Arc<dyn Any + Send + Sync>;

thread_local! {
    /// Capabilities being produced on this thread, keyed by container address.
    static IN_FLIGHT: RefCell<Vec<(usize, Capability)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a capability as in flight until dropped, including on unwind.
struct InFlightGuard;

impl InFlightGuard {
    fn enter(container: &Container, capability: Capability) -> Self {
        IN_FLIGHT.with(|s| s.borrow_mut().push((container.key(), capability)));
        InFlightGuard
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        IN_FLIGHT.with(|s| {
            s.borrow_mut().pop();
        });
    }
}
type ErasedProducer = dyn Fn(&Resolver<'_>) -> Result<Erased, ContainerError> + Send + Sync;

/// Identifies a capability by type. The name is kept for diagnostics only.
#[derive(Clone, Copy)]
pub struct Capability {
    id: TypeId,
    name: &'static str,
}

impl Capability {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Lifetime policy for producer-backed bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Transient,
    Singleton,
}

/// Structured errors for registration and resolution.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("no binding registered for capability '{capability}'")]
    Unresolved { capability: &'static str },
    #[error("cyclic dependency detected: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<&'static str> },
    #[error("capability '{capability}' is already bound")]
    DuplicateBinding { capability: &'static str },
    #[error("producer for capability '{capability}' failed")]
    Producer {
        capability: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("binding for capability '{capability}' holds a value of another type")]
    TypeMismatch { capability: &'static str },
}

impl ContainerError {
    /// Wrap an arbitrary failure raised while producing `T`.
    pub fn producer<T: ?Sized + 'static>(source: impl Into<anyhow::Error>) -> Self {
        ContainerError::Producer {
            capability: type_name::<T>(),
            source: source.into(),
        }
    }
}

/// Recorded when a binding was replaced under [`DuplicatePolicy::Overwrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateBindingWarning {
    pub capability: &'static str,
}

impl fmt::Display for DuplicateBindingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "capability '{}' was registered again; the previous binding was replaced",
            self.capability
        )
    }
}

enum Binding {
    Transient(Arc<ErasedProducer>),
    Singleton {
        producer: Arc<ErasedProducer>,
        cell: Mutex<Option<Erased>>,
    },
    Instance(Erased),
}

impl Binding {
    fn produce(&self, resolver: &Resolver<'_>) -> Result<Erased, ContainerError> {
        match self {
            Binding::Instance(value) => Ok(Arc::clone(value)),
            Binding::Transient(producer) => producer(resolver),
            Binding::Singleton { producer, cell } => {
                if let Some(value) = cell.lock().as_ref() {
                    return Ok(Arc::clone(value));
                }
                // The lock is not held while producing: the producer may resolve
                // other singletons. If two threads race, the first stored value wins.
                let produced = producer(resolver)?;
                let mut slot = cell.lock();
                Ok(Arc::clone(slot.get_or_insert(produced)))
            }
        }
    }
}

/// Flat, process-wide registry of capability bindings.
pub struct Container {
    bindings: DashMap<Capability, Arc<Binding>>,
    policy: DuplicatePolicy,
    warnings: Mutex<Vec<DuplicateBindingWarning>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut capabilities: Vec<&'static str> =
            self.bindings.iter().map(|e| e.key().name).collect();
        capabilities.sort_unstable();
        f.debug_struct("Container")
            .field("policy", &self.policy)
            .field("capabilities", &capabilities)
            .finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            bindings: DashMap::new(),
            policy,
            warnings: Mutex::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Bind `T` to a producer with the given lifetime.
    pub fn register<T, F>(&self, lifetime: Lifetime, producer: F) -> Result<(), ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        // Arc<T> may be unsized-pointee, so it is boxed once more behind `dyn Any`.
        let erased: Arc<ErasedProducer> =
            Arc::new(move |r: &Resolver<'_>| producer(r).map(|v| Arc::new(v) as Erased));
        let binding = match lifetime {
            Lifetime::Transient => Binding::Transient(erased),
            Lifetime::Singleton => Binding::Singleton {
                producer: erased,
                cell: Mutex::new(None),
            },
        };
        self.bind(Capability::of::<T>(), binding)
    }

    pub fn register_transient<T, F>(&self, producer: F) -> Result<(), ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        self.register(Lifetime::Transient, producer)
    }

    pub fn register_singleton<T, F>(&self, producer: F) -> Result<(), ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> Result<Arc<T>, ContainerError> + Send + Sync + 'static,
    {
        self.register(Lifetime::Singleton, producer)
    }

    /// Bind `T` to an already constructed instance.
    pub fn register_instance<T>(&self, instance: Arc<T>) -> Result<(), ContainerError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bind(
            Capability::of::<T>(),
            Binding::Instance(Arc::new(instance) as Erased),
        )
    }

    /// Resolve a required capability.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        Resolver::root(self).resolve()
    }

    /// Resolve an optional capability: a missing binding is `Ok(None)`, any
    /// other failure (cycles, producer errors) is still returned.
    pub fn try_resolve<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        Resolver::root(self).try_resolve()
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&Capability::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings replaced so far under the overwrite policy.
    pub fn duplicate_warnings(&self) -> Vec<DuplicateBindingWarning> {
        self.warnings.lock().clone()
    }

    fn bind(&self, capability: Capability, binding: Binding) -> Result<(), ContainerError> {
        use dashmap::mapref::entry::Entry;

        match self.bindings.entry(capability) {
            Entry::Vacant(v) => {
                tracing::trace!(capability = capability.name, "Capability bound");
                v.insert(Arc::new(binding));
                Ok(())
            }
            Entry::Occupied(mut o) => match self.policy {
                DuplicatePolicy::Reject => Err(ContainerError::DuplicateBinding {
                    capability: capability.name,
                }),
                DuplicatePolicy::Overwrite => {
                    o.insert(Arc::new(binding));
                    let warning = DuplicateBindingWarning {
                        capability: capability.name,
                    };
                    tracing::warn!(capability = capability.name, "{warning}");
                    self.warnings.lock().push(warning);
                    Ok(())
                }
            },
        }
    }

    fn key(&self) -> usize {
        self as *const Container as usize
    }

    fn binding(&self, capability: &Capability) -> Option<Arc<Binding>> {
        // Clone out so no shard lock is held while a producer runs.
        self.bindings.get(capability).map(|b| Arc::clone(b.value()))
    }
}

/// Resolution handle given to producers; tracks the capabilities currently
/// being built on this resolution path.
pub struct Resolver<'c> {
    container: &'c Container,
    chain: Vec<Capability>,
}

impl<'c> Resolver<'c> {
    /// Starts from whatever this thread is already producing in `container`.
    fn root(container: &'c Container) -> Self {
        let key = container.key();
        let chain = IN_FLIGHT.with(|s| {
            s.borrow()
                .iter()
                .filter(|(owner, _)| *owner == key)
                .map(|(_, capability)| *capability)
                .collect()
        });
        Self { container, chain }
    }

    /// The container being resolved from. Resolutions made through it keep
    /// the current chain, so cycles across it are still reported.
    pub fn container(&self) -> &'c Container {
        self.container
    }

    /// Resolve a required dependency of the capability being produced.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        let capability = Capability::of::<T>();

        if self.chain.contains(&capability) {
            let mut path: Vec<&'static str> = self
                .chain
                .iter()
                .skip_while(|c| **c != capability)
                .map(|c| c.name)
                .collect();
            // Close the cycle by adding the first node again
            path.push(capability.name);
            return Err(ContainerError::CyclicDependency { path });
        }

        let binding = self
            .container
            .binding(&capability)
            .ok_or(ContainerError::Unresolved {
                capability: capability.name,
            })?;

        let mut chain = Vec::with_capacity(self.chain.len() + 1);
        chain.extend_from_slice(&self.chain);
        chain.push(capability);
        let nested = Resolver {
            container: self.container,
            chain,
        };

        let erased = {
            let _in_flight = InFlightGuard::enter(self.container, capability);
            binding.produce(&nested)?
        };
        erased
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ContainerError::TypeMismatch {
                capability: capability.name,
            })
    }

    /// Optional dependency: `Ok(None)` only when `T` itself is unbound.
    pub fn try_resolve<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        if !self.container.contains::<T>() {
            return Ok(None);
        }
        self.resolve().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    struct German;
    impl Greeter for German {
        fn greet(&self) -> String {
            "hallo".into()
        }
    }

    #[derive(Default)]
    struct Counter {
        value: Mutex<u32>,
    }

    #[test]
    fn singleton_returns_identical_instance() {
        let c = Container::new();
        let built = Arc::new(AtomicUsize::new(0));
        let b = Arc::clone(&built);
        c.register_singleton(move |_| {
            b.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Counter::default()))
        })
        .unwrap();

        let first: Arc<Counter> = c.resolve().unwrap();
        let second: Arc<Counter> = c.resolve().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_returns_distinct_independent_instances() {
        let c = Container::new();
        c.register_transient(|_| Ok(Arc::new(Counter::default())))
            .unwrap();

        let first: Arc<Counter> = c.resolve().unwrap();
        let second: Arc<Counter> = c.resolve().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        *first.value.lock() = 42;
        assert_eq!(*second.value.lock(), 0);
    }

    #[test]
    fn instance_binding_returns_the_registered_object() {
        let c = Container::new();
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        c.register_instance(Arc::clone(&greeter)).unwrap();

        let resolved: Arc<dyn Greeter> = c.resolve().unwrap();
        assert!(Arc::ptr_eq(&resolved, &greeter));
        assert_eq!(resolved.greet(), "hello");
    }

    #[test]
    fn unregistered_capability_is_an_error() {
        let c = Container::new();
        match c.resolve::<dyn Greeter>() {
            Err(ContainerError::Unresolved { capability }) => {
                assert!(capability.contains("Greeter"))
            }
            other => panic!("expected Unresolved, got {:?}", other.map(|_| ())),
        }
        assert!(c.try_resolve::<dyn Greeter>().unwrap().is_none());
    }

    struct NodeA(#[allow(dead_code)] Arc<NodeB>);
    struct NodeB(#[allow(dead_code)] Arc<NodeA>);

    #[test]
    fn cycle_is_reported_with_its_path() {
        let c = Container::new();
        c.register_transient(|r| Ok(Arc::new(NodeA(r.resolve()?))))
            .unwrap();
        c.register_transient(|r| Ok(Arc::new(NodeB(r.resolve()?))))
            .unwrap();

        match c.resolve::<NodeA>() {
            Err(ContainerError::CyclicDependency { path }) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].ends_with("NodeA"));
                assert!(path[1].ends_with("NodeB"));
                assert!(path[2].ends_with("NodeA"));
                let msg = ContainerError::CyclicDependency { path }.to_string();
                assert!(msg.contains("cyclic dependency detected"));
                assert!(msg.contains("->"));
            }
            other => panic!("expected CyclicDependency, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn cycle_through_the_container_handle_is_reported() {
        let c = Container::new();
        c.register_transient(|r| Ok(Arc::new(NodeA(r.container().resolve()?))))
            .unwrap();
        c.register_transient(|r| Ok(Arc::new(NodeB(r.resolve()?))))
            .unwrap();

        match c.resolve::<NodeA>() {
            Err(ContainerError::CyclicDependency { path }) => {
                assert_eq!(path.len(), 3);
                assert!(path[0].ends_with("NodeA"));
                assert!(path[1].ends_with("NodeB"));
                assert!(path[2].ends_with("NodeA"));
            }
            other => panic!("expected CyclicDependency, got {:?}", other.map(|_| ())),
        }

        // Nothing stays in flight after the failure.
        assert!(matches!(
            c.resolve::<NodeB>(),
            Err(ContainerError::CyclicDependency { .. })
        ));
        c.register_instance(Arc::new(Counter::default())).unwrap();
        assert!(c.resolve::<Counter>().is_ok());
    }

    #[test]
    fn cycle_through_a_captured_container_is_reported() {
        struct Looping;
        let c = Arc::new(Container::new());
        let weak = Arc::downgrade(&c);
        c.register_singleton::<Looping, _>(move |_| {
            let c = weak
                .upgrade()
                .ok_or_else(|| ContainerError::producer::<Looping>(anyhow::anyhow!("dropped")))?;
            c.resolve::<Looping>()
        })
        .unwrap();

        assert!(matches!(
            c.resolve::<Looping>(),
            Err(ContainerError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn same_capability_from_another_container_is_not_a_cycle() {
        let inner = Arc::new(Container::new());
        inner.register_instance(Arc::new(Counter::default())).unwrap();

        let outer = Container::new();
        let source = Arc::clone(&inner);
        outer
            .register_transient::<Counter, _>(move |_| source.resolve::<Counter>())
            .unwrap();

        let from_outer = outer.resolve::<Counter>().unwrap();
        let from_inner = inner.resolve::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&from_outer, &from_inner));
    }

    #[test]
    fn self_dependent_singleton_is_a_cycle_not_a_deadlock() {
        struct Selfish;
        let c = Container::new();
        c.register_singleton::<Selfish, _>(|r| {
            r.resolve::<Selfish>()?;
            Ok(Arc::new(Selfish))
        })
        .unwrap();

        assert!(matches!(
            c.resolve::<Selfish>(),
            Err(ContainerError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn try_resolve_still_reports_cycles() {
        let c = Container::new();
        c.register_transient(|r| Ok(Arc::new(NodeA(r.resolve()?))))
            .unwrap();
        c.register_transient(|r| Ok(Arc::new(NodeB(r.resolve()?))))
            .unwrap();

        assert!(matches!(
            c.try_resolve::<NodeA>(),
            Err(ContainerError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn missing_nested_dependency_names_the_missing_capability() {
        struct Needy(#[allow(dead_code)] Arc<dyn Greeter>);
        let c = Container::new();
        c.register_transient(|r| Ok(Arc::new(Needy(r.resolve()?))))
            .unwrap();

        match c.resolve::<Needy>() {
            Err(ContainerError::Unresolved { capability }) => {
                assert!(capability.contains("Greeter"))
            }
            other => panic!("expected Unresolved, got {:?}", other.map(|_| ())),
        }
        // Needy itself is bound, so the optional lookup surfaces the failure.
        assert!(c.try_resolve::<Needy>().is_err());
    }

    #[test]
    fn producer_failures_carry_the_capability() {
        let c = Container::new();
        c.register_singleton::<Counter, _>(|_| {
            Err(ContainerError::producer::<Counter>(anyhow::anyhow!(
                "settings missing"
            )))
        })
        .unwrap();

        match c.resolve::<Counter>() {
            Err(ContainerError::Producer { capability, source }) => {
                assert!(capability.ends_with("Counter"));
                assert_eq!(source.to_string(), "settings missing");
            }
            other => panic!("expected Producer, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn failed_singleton_is_retried_on_next_resolution() {
        let c = Container::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&attempts);
        c.register_singleton(move |_| {
            if a.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ContainerError::producer::<Counter>(anyhow::anyhow!("first")))
            } else {
                Ok(Arc::new(Counter::default()))
            }
        })
        .unwrap();

        assert!(c.resolve::<Counter>().is_err());
        assert!(c.resolve::<Counter>().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_binding_overwrites_and_warns_by_default() {
        let c = Container::new();
        c.register_instance::<dyn Greeter>(Arc::new(English)).unwrap();
        c.register_instance::<dyn Greeter>(Arc::new(German)).unwrap();

        assert_eq!(c.resolve::<dyn Greeter>().unwrap().greet(), "hallo");
        let warnings = c.duplicate_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].capability.contains("Greeter"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn duplicate_binding_is_rejected_in_strict_mode() {
        let c = Container::with_policy(DuplicatePolicy::Reject);
        c.register_instance::<dyn Greeter>(Arc::new(English)).unwrap();

        let err = c
            .register_instance::<dyn Greeter>(Arc::new(German))
            .unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateBinding { .. }));
        assert_eq!(c.resolve::<dyn Greeter>().unwrap().greet(), "hello");
        assert!(c.duplicate_warnings().is_empty());
    }

    #[test]
    fn trait_object_and_concrete_type_are_distinct_capabilities() {
        let c = Container::new();
        c.register_instance::<dyn Greeter>(Arc::new(English)).unwrap();
        c.register_instance(Arc::new(English)).unwrap();

        assert!(c.contains::<dyn Greeter>());
        assert!(c.contains::<English>());
        assert_eq!(c.len(), 2);
        assert!(c.duplicate_warnings().is_empty());
    }

    #[test]
    fn dependencies_resolve_through_the_chain() {
        struct Greeting(String);
        let c = Container::new();
        c.register_instance::<dyn Greeter>(Arc::new(German)).unwrap();
        c.register_transient(|r| {
            let g = r.resolve::<dyn Greeter>()?;
            Ok(Arc::new(Greeting(format!("{}, welt", g.greet()))))
        })
        .unwrap();

        assert_eq!(c.resolve::<Greeting>().unwrap().0, "hallo, welt");
    }
}
