//! `#[derive(Injectable)]` attribute handling.

use std::sync::Arc;

use joinery::prelude::*;

struct Transport {
    host: String,
}

#[derive(Injectable)]
#[inject(id = "mailer")]
struct Mailer {
    transport: Arc<Transport>,
    #[inject(default = "noreply@example.com")]
    from: String,
    #[inject(default = 3)]
    retries: u8,
}

#[test]
fn blueprint_lists_fields_in_order() {
    let blueprint = <Mailer as Injectable>::blueprint();

    assert_eq!(blueprint.identifier(), "mailer");
    let names: Vec<&str> = blueprint.params().iter().map(|p| p.name().as_str()).collect();
    assert_eq!(names, vec!["transport", "from", "retries"]);

    let transport = &blueprint.params()[0];
    assert_eq!(transport.declared_type().map(Identifier::as_str), Some("Transport"));
    assert!(!transport.is_optional());

    assert!(blueprint.params()[1].declared_type().is_none());
    assert!(blueprint.params()[1].is_optional());
    assert!(blueprint.params()[2].is_optional());
}

#[test]
fn struct_identifier_override() {
    assert_eq!(Mailer::identifier(), "mailer");

    let container = Container::new();
    container.instance("Transport", Transport { host: String::from("smtp.local") });

    let mailer: Arc<Mailer> = container.make("mailer").unwrap();
    assert_eq!(mailer.transport.host, "smtp.local");
    assert_eq!(mailer.from, "noreply@example.com");
    assert_eq!(mailer.retries, 3);

    // The derived type's own name is not registered.
    assert!(container.resolve("Mailer").is_err());
}

#[test]
fn explicit_parameters_override_defaults() {
    let container = Container::new();
    container.instance("Transport", Transport { host: String::from("smtp.local") });

    let mailer: Arc<Mailer> = container
        .make_with("mailer", &Parameters::new().with("retries", 5u8))
        .unwrap();
    assert_eq!(mailer.retries, 5);
}

#[derive(Injectable)]
struct Replica {
    #[inject(id = "db.replica")]
    primary: Arc<Transport>,
    #[inject(primitive)]
    label: Arc<String>,
}

#[test]
fn field_identifier_and_primitive_arc() {
    let container = Container::new();
    container.instance("db.replica", Transport { host: String::from("replica.local") });
    container.when("Replica").needs("$label").give(Arc::new(String::from("eu-west")));

    let replica = container.make_type::<Replica>().unwrap();
    assert_eq!(replica.primary.host, "replica.local");
    assert_eq!(replica.label.as_str(), "eu-west");
}

#[derive(Injectable)]
#[inject(crate = "joinery")]
struct Clock;

#[test]
fn unit_struct_and_crate_path() {
    let container = Container::new();
    assert!(Clock::blueprint().params().is_empty());
    assert!(container.make_type::<Clock>().is_ok());
}

#[derive(Injectable)]
struct Notifier {
    mailer: Arc<Mailer>,
}

#[test]
fn catalogued_types_resolve_without_registration() {
    let container = Container::new();
    container.instance("Transport", Transport { host: String::from("smtp.local") });
    container.bind("Mailer", "mailer", false);

    let notifier = container.make_type::<Notifier>().unwrap();
    assert_eq!(notifier.mailer.retries, 3);
    assert!(container.verify(["Notifier"]).is_ok());
}

mod billing {
    use joinery::prelude::*;

    #[derive(Injectable)]
    pub struct Client {
        #[inject(default = "https://billing.local")]
        pub endpoint: String,
    }
}

mod shipping {
    use joinery::prelude::*;

    #[derive(Injectable)]
    pub struct Client {
        #[inject(default = "https://shipping.local")]
        pub endpoint: String,
    }
}

#[test]
fn same_named_types_each_build_from_their_own_blueprint() {
    let container = Container::new();

    let billing = container.make_type::<billing::Client>().unwrap();
    let shipping = container.make_type::<shipping::Client>().unwrap();

    assert_eq!(billing.endpoint, "https://billing.local");
    assert_eq!(shipping.endpoint, "https://shipping.local");
}
