//! Shared fixtures and setup for the integration suites.
#![allow(dead_code)]

pub mod source_fixtures;
pub mod token_analyzer;

use std::sync::Arc;

use smol_str::SmolStr;

use javelin::{
    CompileConfig, CompilerService, DeclPtr, FileId, FixedClasspath, MemberKey, Position,
};

use self::token_analyzer::TokenAnalyzer;

pub fn pos(line: usize, column: usize) -> Position {
    Position::new(line, column)
}

/// Pointer to `p.A#foo()`, the symbol most fixtures revolve around.
pub fn foo_ptr() -> DeclPtr {
    DeclPtr {
        container: SmolStr::new("p.A"),
        member: MemberKey::Method {
            name: SmolStr::new("foo"),
            arity: 0,
        },
    }
}

/// A service over the token analyzer with an empty classpath.
pub fn service() -> CompilerService {
    CompilerService::new(Arc::new(TokenAnalyzer), Arc::new(FixedClasspath::new()))
}

pub fn service_with_config(config: CompileConfig) -> CompilerService {
    CompilerService::with_config(
        Arc::new(TokenAnalyzer),
        Arc::new(FixedClasspath::new()),
        config,
    )
}

/// A service with `A.java` and `B.java` open and `B` depending on `A`.
///
/// File ids are assigned in open order, so the dependency edge can be
/// declared up front.
pub fn ab_service() -> (CompilerService, FileId, FileId) {
    let (a, b) = (FileId::new(0), FileId::new(1));
    let mut classpath = FixedClasspath::new();
    classpath.insert(b, vec![a]);
    let service = CompilerService::new(Arc::new(TokenAnalyzer), Arc::new(classpath));
    assert_eq!(service.open("A.java", source_fixtures::A_JAVA), a);
    assert_eq!(service.open("B.java", source_fixtures::B_JAVA), b);
    (service, a, b)
}
