use std::sync::Arc;

use replicant_shared::{Field, HostType, KindBuilder, Protocol, Role, Rpc, TypeFlag, Value};

pub const PAWN: &str = "Pawn";
/// Extends `Pawn`, overriding `set_score` and adding `polish`
pub const RELIC: &str = "Relic";
/// Scored by the server, which pushes each score to its owner through a
/// reliable client RPC
pub const SCOREBOARD: &str = "Scoreboard";

pub const SCORE: &str = "score";
pub const SET_SCORE: &str = "set_score";
pub const TAUNT: &str = "taunt";

/// Kinds shared by the server and clients of every test
pub fn protocol() -> Arc<Protocol> {
    let mut protocol = Protocol::builder();
    protocol
        .add_kind(
            KindBuilder::new(PAWN)
                .roles(Role::Authority, Role::AutonomousProxy)
                .field(
                    Field::new(SCORE, TypeFlag::integer().max_value(100))
                        .initial(0u64)
                        .notify(),
                )
                .field(Field::new("set_count", TypeFlag::integer().max_bits(16)).initial(0u64))
                .field(Field::new("replicated_count", TypeFlag::integer().max_bits(16)).initial(0u64))
                .field(Field::new("last_taunt", TypeFlag::text()).initial(""))
                .replicate_when(|_, _| vec![SCORE, "set_count"])
                .on_replicated(|pawn, name| {
                    if name == SCORE {
                        let count = counter(pawn.get("replicated_count").ok());
                        // local bookkeeping, never replicated
                        let _ = pawn.set("replicated_count", count + 1);
                    }
                })
                .rpc(
                    Rpc::new(SET_SCORE, HostType::Server, |pawn, arguments| {
                        let count = counter(pawn.get("set_count").ok());
                        if let Some(score) = arguments.first() {
                            let _ = pawn.set(SCORE, score.clone());
                        }
                        let _ = pawn.set("set_count", count + 1);
                    })
                    .parameter(TypeFlag::integer().max_value(100))
                    .reliable()
                    .simulated(),
                )
                .rpc(
                    Rpc::new(TAUNT, HostType::Client, |pawn, arguments| {
                        if let Some(text) = arguments.first() {
                            let _ = pawn.set("last_taunt", text.clone());
                        }
                    })
                    .parameter(TypeFlag::text().max_length(32))
                    .simulated(),
                ),
        )
        .and_then(|protocol| {
            protocol.add_kind(
                KindBuilder::new(RELIC)
                    .extends(PAWN)
                    .field(Field::new("shine", TypeFlag::float()).initial(0.0f32))
                    .rpc(
                        Rpc::new(SET_SCORE, HostType::Server, |relic, arguments| {
                            if let Some(score) = arguments.first().and_then(Value::as_u64) {
                                let _ = relic.set(SCORE, (score * 2).min(100));
                            }
                        })
                        .parameter(TypeFlag::integer().max_value(100))
                        .reliable()
                        .simulated(),
                    )
                    .rpc(Rpc::new("polish", HostType::Server, |relic, _| {
                        let _ = relic.set("shine", 1.0f32);
                    })),
            )
        })
        .and_then(|protocol| {
            protocol.add_kind(
                KindBuilder::new(SCOREBOARD)
                    .roles(Role::Authority, Role::AutonomousProxy)
                    .field(Field::new(SCORE, TypeFlag::integer().max_value(100)).initial(0u64))
                    .field(Field::new("invocations", TypeFlag::integer().max_bits(16)).initial(0u64))
                    .field(Field::new("last_argument", TypeFlag::integer().max_value(100)))
                    .replicate_when(|_, _| vec![SCORE])
                    .rpc(
                        Rpc::new(SET_SCORE, HostType::Client, |board, arguments| {
                            let count = counter(board.get("invocations").ok());
                            let _ = board.set("invocations", count + 1);
                            if let Some(score) = arguments.first() {
                                let _ = board.set("last_argument", score.clone());
                            }
                        })
                        .parameter(TypeFlag::integer().max_value(100))
                        .reliable(),
                    ),
            )
        })
        .expect("test kinds are valid");
    Arc::new(protocol.build().expect("test protocol builds"))
}

fn counter(value: Option<&Value>) -> u64 {
    value.and_then(Value::as_u64).unwrap_or(0)
}
