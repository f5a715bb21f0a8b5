//! End-to-end resolution scenarios.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use joinery::downcast;
use joinery::prelude::*;

struct Logger {
    id: u32,
}

#[derive(Injectable)]
struct Service {
    logger: Arc<Logger>,
}

#[test]
fn factory_dependency_injected_into_auto_resolved_type() {
    let container = Container::new();
    container.bind_factory("Logger", |_, _| Ok(Logger { id: 1 }), false);

    let service: Arc<Service> = container.make("Service").unwrap();
    assert_eq!(service.logger.id, 1);
}

#[test]
fn unbound_interface_is_not_instantiable() {
    let container = Container::new();

    let err = container.resolve("AbstractInterface").unwrap_err();
    assert!(matches!(err, ContainerError::NotInstantiable(_)));
    assert!(err.to_string().contains("AbstractInterface"));
}

#[derive(Injectable)]
struct HttpClient {
    #[inject(default = 30)]
    timeout: u64,
}

#[test]
fn primitive_default_used() {
    let container = Container::new();
    let client = container.make_type::<HttpClient>().unwrap();
    assert_eq!(client.timeout, 30);
}

#[derive(Injectable)]
struct Greeting {
    name: String,
    punctuation: String,
}

#[test]
fn positional_parameters_bind_by_name() {
    let container = Container::new();

    let by_position = container
        .build("Greeting", &Parameters::new().at(0, String::from("val")).with("punctuation", String::from("!")))
        .unwrap();
    let by_name = container
        .build("Greeting", &Parameters::new().with("name", String::from("val")).with("punctuation", String::from("!")))
        .unwrap();

    let by_position = downcast::<Greeting>(&"Greeting".into(), by_position).unwrap();
    let by_name = downcast::<Greeting>(&"Greeting".into(), by_name).unwrap();
    assert_eq!(by_position.name, "val");
    assert_eq!(by_position.name, by_name.name);
    assert_eq!(by_position.punctuation, "!");
}

#[test]
fn missing_primitive_is_unresolvable() {
    let container = Container::new();

    match container.resolve("Greeting") {
        Err(ContainerError::UnresolvableDependency(err)) => {
            assert_eq!(err.parameter, "name");
            assert_eq!(err.declaring, "Greeting");
        }
        other => panic!("Expected UnresolvableDependency, got: {other:?}"),
    }
}

trait Storage: Send + Sync {
    fn kind(&self) -> &'static str;
}

struct LocalStorage;
struct S3Storage;

impl Storage for LocalStorage {
    fn kind(&self) -> &'static str {
        "local"
    }
}

impl Storage for S3Storage {
    fn kind(&self) -> &'static str {
        "s3"
    }
}

#[derive(Injectable)]
struct PhotoController {
    #[inject(id = "Storage")]
    storage: Arc<Box<dyn Storage>>,
}

#[derive(Injectable)]
struct VideoController {
    #[inject(id = "Storage")]
    storage: Arc<Box<dyn Storage>>,
}

#[test]
fn contextual_override_applies_only_to_its_consumer() {
    let container = Container::new();
    container.singleton_factory("Storage", |_, _| Ok(Box::new(LocalStorage) as Box<dyn Storage>));
    container
        .when("PhotoController")
        .needs("Storage")
        .give_factory(|_, _| Ok(Box::new(S3Storage) as Box<dyn Storage>));

    let photos = container.make_type::<PhotoController>().unwrap();
    let videos = container.make_type::<VideoController>().unwrap();

    assert_eq!(photos.storage.kind(), "s3");
    assert_eq!(videos.storage.kind(), "local");

    // The override never lands in the cache under "Storage".
    let global: Arc<Box<dyn Storage>> = container.make("Storage").unwrap();
    assert_eq!(global.kind(), "local");
}

struct Fallback {
    name: &'static str,
}

#[derive(Injectable)]
struct Reporter {
    #[inject(id = "MissingSink", default = Arc::new(Fallback { name: "stderr" }))]
    sink: Arc<Fallback>,
}

#[test]
fn optional_class_dependency_falls_back_to_default() {
    let container = Container::new();
    let reporter = container.make_type::<Reporter>().unwrap();
    assert_eq!(reporter.sink.name, "stderr");
}

#[derive(Injectable)]
struct Pool;

#[test]
fn shared_resolutions_are_identical() {
    let container = Container::new();
    container.singleton("Pool", "Pool");

    let first: Arc<Pool> = container.make("Pool").unwrap();
    let second: Arc<Pool> = container.make("Pool").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn transient_resolutions_follow_cache_policy() {
    let container = Container::new();
    let first: Arc<Pool> = container.make("Pool").unwrap();
    let second: Arc<Pool> = container.make("Pool").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    let caching = Container::builder().cache_policy(CachePolicy::EveryResolve).build().unwrap();
    let first: Arc<Pool> = caching.make("Pool").unwrap();
    let second: Arc<Pool> = caching.make("Pool").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[derive(Injectable)]
struct Report {
    title: String,
}

#[test]
fn factory_wins_over_blueprint() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();

    let container = Container::new();
    container.bind_factory(
        "Report",
        move |_, params| {
            seen.fetch_add(1, Ordering::SeqCst);
            let title = params.get::<String>("title")?.map(|t| (*t).clone()).unwrap_or_default();
            Ok(Report { title: format!("factory: {title}") })
        },
        false,
    );

    let report: Arc<Report> = container
        .make_with("Report", &Parameters::new().with("title", String::from("Q3")))
        .unwrap();

    assert_eq!(report.title, "factory: Q3");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[derive(Injectable)]
struct Chicken {
    #[allow(dead_code)]
    egg: Arc<Egg>,
}

#[derive(Injectable)]
struct Egg {
    #[allow(dead_code)]
    chicken: Arc<Chicken>,
}

#[test]
fn circular_dependency_detected() {
    let container = Container::new();

    match container.resolve("Chicken") {
        Err(ContainerError::CircularDependency(err)) => {
            let chain: Vec<&str> = err.chain.iter().map(Identifier::as_str).collect();
            assert_eq!(chain, vec!["Chicken", "Egg", "Chicken"]);
        }
        other => panic!("Expected CircularDependency, got: {other:?}"),
    }

    assert!(container.verify(["Egg"]).unwrap_err().is_circular());
}

#[test]
fn failure_chain_names_consumers() {
    #[derive(Injectable)]
    struct Checkout {
        #[allow(dead_code)]
        #[inject(id = "PaymentGateway")]
        gateway: Arc<()>,
    }

    let container = Container::new();
    container.define_type::<Checkout>();

    let message = container.resolve("Checkout").unwrap_err().to_string();
    assert!(message.contains("Target [PaymentGateway] is not instantiable while building [Checkout]."));
}

#[test]
fn providers_register_bindings_and_values() {
    #[derive(Default)]
    struct LoggingProvider;

    impl ServiceProvider for LoggingProvider {
        fn register(&self, container: &Container, values: &ProviderValues) -> Result<()> {
            let id = values.get::<u32>("logger.id")?.map_or(0, |id| *id);
            container.singleton_factory("Logger", move |_, _| Ok(Logger { id }));
            Ok(())
        }
    }

    let container = Container::builder()
        .provider_with(LoggingProvider, ProviderValues::new().with("logger.id", 7u32))
        .build()
        .unwrap();

    assert!(container.has_provider("LoggingProvider"));
    assert_eq!(*container.get_as::<u32>("logger.id").unwrap().unwrap(), 7);

    let service = container.make_type::<Service>().unwrap();
    assert_eq!(service.logger.id, 7);
}
