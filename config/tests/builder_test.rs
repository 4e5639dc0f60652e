use confluent::{Bind, Builder, ConfigError, EnvSource, FileSource, SourceError, bind_leaf};
use serde::Deserialize;
use serial_test::serial;
use std::env;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[derive(Debug, Default, Clone, PartialEq, Bind)]
struct TlsConfig {
    #[bind(default = "/etc/ssl/ca")]
    ca: String,
    #[bind(default = "/etc/ssl/server.key")]
    key: String,
    #[bind(default = "/etc/ssl/server.crt")]
    cert: String,
    #[bind(default = "true")]
    disabled: bool,
    #[bind(default = "false")]
    enable_mtls: bool
}

#[derive(Debug, Default, Clone, PartialEq, Bind)]
struct ServerConfig {
    #[bind(default = "8080")]
    http_port: u16,
    #[bind(default = "8443")]
    https_port: u16,
    #[bind(default = "localhost")]
    host: String,
    #[bind(default = "server")]
    name: String,
    tls: TlsConfig
}

#[derive(Debug, Default, Clone, PartialEq, Bind)]
struct MongoConfig {
    #[bind(default = "mongodb")]
    scheme: String,
    #[bind(default = "localhost")]
    host: String,
    #[bind(default = "27017")]
    port: u16,
    #[bind(default = "username")]
    username: String,
    #[bind(default = "password")]
    password: String,
    #[bind(default = "test")]
    database: String,
    #[bind(default = "test")]
    collection: String,
    #[bind(default = "?ssl=true")]
    params: String,
    #[bind(default = "")]
    replica_set: String,
    #[bind(default = "10")]
    connect_timeout: u64,
    #[bind(default = "primary")]
    read_preference: String
}

#[derive(Debug, Default, Clone, PartialEq, Bind)]
struct LogConfig {
    #[bind(default = "error")]
    level: String,
    #[bind(default = "stdout,file:logs/app.log")]
    outputs: Vec<String>,
    #[bind(default = "body")]
    message_field: String,
    #[bind(default = "")]
    resource: String
}

#[derive(Debug, Default, Clone, PartialEq, Bind)]
struct AppConfig {
    log: LogConfig,
    mongo: MongoConfig,
    server: ServerConfig
}

#[derive(Debug, Default, Clone, PartialEq, Bind)]
struct MongoWrapper {
    #[bind(key = "mongo")]
    settings: MongoConfig
}

fn assert_fixture_mongo(config: &MongoConfig) {
    assert_eq!(config.scheme, "mongodb+srv");
    assert_eq!(config.host, "mongo.example.com");
    assert_eq!(config.port, 27018);
    assert_eq!(config.username, "toml-user");
    assert_eq!(config.password, "toml-pass");
    assert_eq!(config.database, "toml-db");
    assert_eq!(config.collection, "toml-collection");
    assert_eq!(config.params, "?retryWrites=true&w=majority");
    assert_eq!(config.replica_set, "rs0");
    assert_eq!(config.connect_timeout, 20);
    assert_eq!(config.read_preference, "secondary");
}

const TEST_ENV: &[(&str, &str)] = &[
    ("APP__LOG__LEVEL", "debug"),
    ("APP__LOG__OUTPUTS", r#"["stdout"]"#),
    ("APP__MONGO__COLLECTION", "test-collection"),
    ("APP__MONGO__DATABASE", "test-db"),
    ("APP__MONGO__HOST", "test.mongo.local"),
    ("APP__MONGO__OPERATION_TIMEOUT", "10s"),
    ("APP__MONGO__PASSWORD", "dummy-password"),
    ("APP__MONGO__USERNAME", "dummy-user"),
    ("APP__SERVER__HOST", "127.0.0.1"),
    ("APP__SERVER__HTTPS_PORT", "9443"),
    ("APP__SERVER__HTTP_PORT", "9000"),
    ("APP__SERVER__NAME", "dummy-server"),
    ("APP__SERVER__TLS__ENABLE_MTLS", "true"),
    ("PLACEHOLDER", "dummy-placeholder")
];

fn set_test_env() {
    for (key, value) in TEST_ENV {
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn clear_test_env() {
    for (key, _) in TEST_ENV {
        unsafe {
            env::remove_var(key);
        }
    }
}

#[test]
#[serial]
fn test_env_source_nests_and_coerces() {
    set_test_env();

    let mut config = AppConfig::default();
    let mut builder = Builder::new().env_prefix("APP").env_separator("__");
    builder.set_source("env", 100).load(&mut config);

    clear_test_env();

    assert!(!builder.has_errors(), "{:?}", builder.errors());

    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.outputs, vec!["stdout"]);
    assert_eq!(config.log.message_field, "body");

    assert_eq!(config.mongo.database, "test-db");
    assert_eq!(config.mongo.collection, "test-collection");
    assert_eq!(config.mongo.username, "dummy-user");
    assert_eq!(config.mongo.password, "dummy-password");
    assert_eq!(config.mongo.host, "test.mongo.local");
    assert_eq!(config.mongo.port, 27017);

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.http_port, 9000);
    assert_eq!(config.server.https_port, 9443);
    assert_eq!(config.server.name, "dummy-server");
    assert!(config.server.tls.disabled);
    assert!(config.server.tls.enable_mtls);
    assert_eq!(config.server.tls.ca, "/etc/ssl/ca");
}

#[test]
#[serial]
fn test_env_overrides_file_by_priority() {
    unsafe {
        env::set_var("APP__MONGO__PORT", "28000");
    }

    let mut low_env = AppConfig::default();
    let mut builder = Builder::new();
    builder
        .set_source("env", 10)
        .set_source(&fixture("config.toml"), 100)
        .load(&mut low_env);

    let mut high_env = AppConfig::default();
    let mut other = Builder::new();
    other
        .set_source(&fixture("config.toml"), 100)
        .set_source("env", 1000)
        .load(&mut high_env);

    unsafe {
        env::remove_var("APP__MONGO__PORT");
    }

    assert!(!builder.has_errors(), "{:?}", builder.errors());
    assert!(!other.has_errors(), "{:?}", other.errors());
    assert_eq!(low_env.mongo.port, 27018);
    assert_eq!(high_env.mongo.port, 28000);
    assert_eq!(high_env.mongo.host, "mongo.example.com");
}

#[test]
fn test_dotenv_files_layer_by_priority() {
    #[derive(Debug, Default, Bind)]
    struct Log {
        level: String
    }

    #[derive(Debug, Default, Bind)]
    struct Mongo {
        database: String
    }

    #[derive(Debug, Default, Bind)]
    struct Server {
        host: String
    }

    #[derive(Debug, Default, Bind)]
    struct Config {
        log: Log,
        mongo: Mongo,
        server: Server
    }

    let mut config = Config::default();
    let mut builder = Builder::new();
    builder
        .set_source(&fixture(".env"), 100)
        .set_source(&fixture(".env.development"), 1000)
        .load(&mut config);

    assert!(!builder.has_errors(), "{:?}", builder.errors());
    assert_eq!(config.log.level, "error");
    assert_eq!(config.mongo.database, "test-db");
    assert_eq!(config.server.host, "127.0.0.1");
}

#[test]
fn test_toml_json_and_yaml_bind_equal_records() {
    let mut records = Vec::new();

    for file in ["config.toml", "mongo.json", "mongo.yaml"] {
        let mut wrapper = MongoWrapper::default();
        let mut builder = Builder::new();
        builder.set_source(&fixture(file), 100).load(&mut wrapper);

        assert!(!builder.has_errors(), "{file}: {:?}", builder.errors());
        assert_fixture_mongo(&wrapper.settings);
        records.push(wrapper.settings);
    }

    assert_eq!(records[0], records[1]);
    assert_eq!(records[1], records[2]);
}

#[test]
fn test_section_and_self_named_binding_match_wrapper() {
    let mut wrapper = MongoWrapper::default();
    let mut section = MongoConfig::default();

    let mut builder = Builder::new();
    builder
        .set_source(&fixture("mongo.yaml"), 100)
        .load(&mut wrapper)
        .load_section(&mut section, "MONGO");

    assert!(!builder.has_errors(), "{:?}", builder.errors());
    assert_eq!(wrapper.settings, section);

    #[derive(Debug, Default, PartialEq, Bind)]
    struct Mongo {
        #[bind(default = "mongodb")]
        scheme: String,
        #[bind(default = "27017")]
        port: u16,
        replica_set: String
    }

    let mut whole = Mongo::default();
    let mut scoped = Mongo::default();
    builder.load(&mut whole).load_section(&mut scoped, "Mongo");

    assert!(!builder.has_errors(), "{:?}", builder.errors());
    assert_eq!(whole, scoped);
    assert_eq!(whole.port, 27018);
    assert_eq!(whole.replica_set, "rs0");
}

#[test]
fn test_bad_files_record_one_error_each_and_keep_defaults() {
    #[derive(Debug, Default, Bind)]
    struct Section {
        #[bind(default = "default")]
        name: String
    }

    let mut section = Section::default();
    let mut builder = Builder::new();
    builder
        .set_source(&fixture("bad.toml"), 100)
        .set_source(&fixture("bad.yaml"), 101)
        .set_source(&fixture("bad.json"), 102)
        .load(&mut section);

    assert!(builder.has_errors());
    assert_eq!(builder.errors().len(), 3);
    assert_eq!(section.name, "default");

    let formats: Vec<_> = builder
        .errors()
        .iter()
        .map(|err| match err {
            ConfigError::Source(SourceError::Parse { format, .. }) => *format,
            other => panic!("unexpected error: {other}")
        })
        .collect();
    assert_eq!(formats, vec!["toml", "yaml", "json"]);

    let folded = builder.ensure_ok().unwrap_err();
    assert_eq!(folded.len(), 3);
}

#[test]
fn test_flat_sources_merge_in_priority_order() {
    #[derive(Debug, Default, Bind)]
    struct ServerCfg {
        host: String,
        port: i32,
        name: String
    }

    let mut config = ServerCfg::default();
    let mut builder = Builder::new();
    builder
        .set_source(&fixture("flat.yaml"), 3)
        .set_source(&fixture("flat.toml"), 1)
        .set_source(&fixture("flat.json"), 2)
        .load(&mut config);

    assert!(!builder.has_errors(), "{:?}", builder.errors());
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 9090);
    assert_eq!(config.name, "hello");
}

#[test]
fn test_multiple_records_from_one_flat_file() {
    #[derive(Debug, Default, Bind)]
    struct Mongo {
        #[bind(default = "mongodb")]
        scheme: String,
        #[bind(key = "mongo_host", default = "localhost")]
        host: String,
        #[bind(key = "mongo_port", default = "27017")]
        port: u16,
        #[bind(default = "username")]
        username: String,
        #[bind(default = "password")]
        password: String,
        #[bind(default = "test")]
        database: String,
        #[bind(default = "test")]
        collection: String,
        #[bind(default = "?ssl=true")]
        params: String,
        replica_set: String,
        #[bind(default = "10")]
        connect_timeout: u64,
        #[bind(default = "primary")]
        read_preference: String
    }

    #[derive(Debug, Default, Bind)]
    struct ServerCfg {
        host: String,
        port: i32
    }

    let mut server = ServerCfg::default();
    let mut mongo = Mongo::default();
    let mut builder = Builder::new();
    builder
        .set_source(&fixture("multi-flat.toml"), 1)
        .load(&mut server)
        .load(&mut mongo);

    assert!(!builder.has_errors(), "{:?}", builder.errors());
    assert_eq!(server.host, "localhost");
    assert_eq!(server.port, 8080);

    assert_eq!(mongo.scheme, "mongodb+srv");
    assert_eq!(mongo.host, "mongo.example.com");
    assert_eq!(mongo.port, 27018);
    assert_eq!(mongo.username, "toml-user");
    assert_eq!(mongo.password, "toml-pass");
    assert_eq!(mongo.database, "toml-db");
    assert_eq!(mongo.collection, "toml-collection");
    assert_eq!(mongo.params, "?retryWrites=true&w=majority");
    assert_eq!(mongo.replica_set, "rs0");
    assert_eq!(mongo.connect_timeout, 20);
    assert_eq!(mongo.read_preference, "secondary");
}

#[test]
fn test_present_key_never_falls_back_to_default() {
    let dir = tempfile::TempDir::new().unwrap();
    let base = dir.path().join("base.json");
    let overlay = dir.path().join("overlay.yaml");
    std::fs::write(&base, r#"{ "mongo": { "port": 28000, "database": "base" } }"#).unwrap();
    std::fs::write(&overlay, "mongo:\n  port: not-a-port\n").unwrap();

    let mut config = AppConfig::default();
    let mut builder = Builder::new();
    builder
        .add_source(FileSource::json(&base, 1))
        .add_source(FileSource::yaml(&overlay, 2))
        .load(&mut config);

    assert!(!builder.has_errors(), "{:?}", builder.errors());
    // The merged value does not fit a u16: the field keeps its zero value,
    // the "27017" default is not consulted because the key is present.
    assert_eq!(config.mongo.port, 0);
    assert_eq!(config.mongo.database, "base");
    assert_eq!(config.mongo.host, "localhost");
}

#[test]
fn test_explicit_sources_and_custom_leaf_types() {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum ReadPreference {
        #[default]
        Primary,
        Secondary,
        Nearest
    }

    bind_leaf!(ReadPreference);

    #[derive(Debug, Default, Bind)]
    struct Mongo {
        #[bind(default = "nearest")]
        read_preference: ReadPreference,
        #[bind(key = "replica_set")]
        replicas: Option<String>,
        #[bind(default = "27017")]
        port: u16
    }

    let mut from_file = Mongo::default();
    let mut builder = Builder::new();
    builder
        .add_source(FileSource::toml(fixture("config.toml"), 1).with_name("base"))
        .load_section(&mut from_file, "mongo");

    assert!(!builder.has_errors(), "{:?}", builder.errors());
    assert_eq!(from_file.read_preference, ReadPreference::Secondary);
    assert_eq!(from_file.replicas.as_deref(), Some("rs0"));
    assert_eq!(from_file.port, 27018);

    let mut defaults = Mongo::default();
    let mut empty = Builder::new();
    empty
        .add_source(EnvSource::dotenv(fixture(".env"), 1).with_prefix("NOTHING"))
        .load(&mut defaults);

    assert!(!empty.has_errors(), "{:?}", empty.errors());
    assert_eq!(defaults.read_preference, ReadPreference::Nearest);
    assert_eq!(defaults.replicas, None);
    assert_eq!(defaults.port, 27017);

    let names: Vec<_> = builder.sources().map(|source| source.name).collect();
    assert_eq!(names, vec!["base"]);
}

#[test]
fn test_registration_errors_do_not_stop_the_pipeline() {
    let mut wrapper = MongoWrapper::default();
    let mut builder = Builder::new();
    builder
        .set_source("settings", 1)
        .set_source(&fixture("config.toml"), 100)
        .set_source("config.ini", 2)
        .load(&mut wrapper);

    let messages: Vec<_> = builder.errors().iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "no source type provided for settings",
            "unsupported source type for config.ini"
        ]
    );
    assert_fixture_mongo(&wrapper.settings);
}
