use terms_of_service::AppError;

#[test]
fn display_prefixes_are_distinct() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::Db("x".into()), "db: x"),
        (AppError::Agreement("x".into()), "agreement: x"),
        (AppError::Watch("x".into()), "watch: x"),
        (AppError::Http("x".into()), "http: x"),
        (AppError::Template("x".into()), "template: x"),
        (AppError::Io("x".into()), "io: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn malformed_xml_maps_to_config_error() {
    #[derive(Debug, serde::Deserialize)]
    struct Root {}

    let xml_err = quick_xml::de::from_str::<Root>("<a></b>").expect_err("mismatched tags");
    let err = AppError::from(xml_err);
    assert!(err.to_string().starts_with("config: malformed agreement config"));
}

#[test]
fn implements_std_error() {
    let err: Box<dyn std::error::Error> = Box::new(AppError::Agreement("missing".into()));
    assert_eq!(err.to_string(), "agreement: missing");
}

#[test]
fn template_failure_maps_to_template_error() {
    let mut tera = tera::Tera::default();
    let tera_err = tera
        .add_raw_template("broken.html", "{% if %}")
        .expect_err("invalid syntax");
    let err = AppError::from(tera_err);
    assert!(err.to_string().starts_with("template: "));
}
