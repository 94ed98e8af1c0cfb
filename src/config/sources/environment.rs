//! Environment source: `TABULA__SECTION__KEY` variables, e.g. `TABULA__CLIENT__AUTH_TOKEN`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("TABULA")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
