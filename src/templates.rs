//! Templates compiled into the binary, registered with the engine by name.

pub const CUSTOM_RECONNAISSANCE: &str = "custom_reconnaissance.py";
pub const CUSTOM_MONITORING: &str = "custom_security_monitoring.py";
pub const LANGCHAIN: &str = "langchain.py";
pub const CREWAI: &str = "crewai.py";
pub const README: &str = "README.md";
pub const DOCKERFILE: &str = "Dockerfile";

pub const ALL: &[(&str, &str)] = &[
    (
        CUSTOM_RECONNAISSANCE,
        include_str!("../templates/custom_reconnaissance.py.j2"),
    ),
    (
        CUSTOM_MONITORING,
        include_str!("../templates/custom_security_monitoring.py.j2"),
    ),
    (LANGCHAIN, include_str!("../templates/langchain.py.j2")),
    (CREWAI, include_str!("../templates/crewai.py.j2")),
    (README, include_str!("../templates/README.md.j2")),
    (DOCKERFILE, include_str!("../templates/Dockerfile")),
];
