use std::{convert::Infallible, sync::Arc};

use azzurro::{
    auto::{AzzurroService, AZZURRO_SERVICE},
    Azzurro, AzzurroError, Injector, RequireError,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Azzurro::global()) {
        Ok(()) => println!("Application ended without error code"),
        Err(e) => eprintln!("Application ended with error: {}", e),
    }
}

fn run(azzurro: &Azzurro) -> Result<(), AzzurroError> {
    println!("Azzurro {}", Azzurro::version());

    azzurro
        .module("greeting", Some(&[]))?
        .factory("greeter", |_| Ok::<_, Infallible>(Greeter { greeting: "Hello" }))?;

    azzurro
        .app("demo", Some(&["auto", "greeting"]))?
        .factory("homeController", |injector: &Injector| {
            let greeter = injector.get_service::<Greeter>("greeter")?;
            Ok::<_, RequireError>(Home { greeter })
        })?;

    let injector = azzurro.injector().clone();
    azzurro.on("AF:route", move |event| {
        let service = injector.get_service::<AzzurroService>(AZZURRO_SERVICE)?;
        println!("{event}: routing, callbacks follow on '{}'", service.callback_event());
        Ok::<_, RequireError>(())
    })?;

    let injector = azzurro.injector().clone();
    azzurro.on("AF:callback", move |_| {
        let home = injector.get_service::<Home>("homeController")?;
        println!("{}", home.render("world"));
        Ok::<_, RequireError>(())
    })?;

    azzurro.bootstrap()
}

struct Greeter {
    greeting: &'static str,
}

struct Home {
    greeter: Arc<Greeter>,
}
impl Home {
    fn render(&self, name: &str) -> String {
        format!("{}, {name}!", self.greeter.greeting)
    }
}
