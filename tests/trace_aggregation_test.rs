use dexbench::emulator::{
    find_by_body_type, traverse, BodyKind, DecodedMessageBody, EmulatedTransaction,
    EmulationResponse, SwapOutputAggregator, TraceMessage, TraceNode, UnsignedMessage,
};

const SENDER: &str = "0:5e9a";
const JETTON_WALLET: &str = "0:77aa";

fn message(value: u128, swap_input: u128) -> UnsignedMessage {
    UnsignedMessage {
        source: SENDER.to_string(),
        destination: "0:router".to_string(),
        body: "te6cc".to_string(),
        value,
        swap_input_amount: swap_input,
        counterparty_wallet: JETTON_WALLET.to_string(),
    }
}

fn labelled(label: &str) -> TraceNode {
    TraceNode::new(TraceMessage::new(label, 0))
}

#[test]
fn test_traversal_is_preorder_and_visits_each_node_once() {
    let tree = labelled("a")
        .with_child(labelled("b").with_child(labelled("c")).with_child(labelled("d")))
        .with_child(labelled("e").with_child(labelled("f")));

    let mut seen = Vec::new();
    traverse(&tree, &mut |node| {
        seen.push(node.in_msg.destination.clone().unwrap_or_default())
    });
    assert_eq!(seen, vec!["a", "b", "c", "d", "e", "f"]);
}

#[test]
fn test_find_by_body_type_keeps_preorder() {
    let transfer = |dest: &str, amount: u128| {
        TraceNode::new(
            TraceMessage::new(dest, 0).with_body(DecodedMessageBody::jetton_transfer(amount)),
        )
    };
    let tree = labelled("root")
        .with_child(transfer("x", 1).with_child(transfer("y", 2)))
        .with_child(
            TraceNode::new(TraceMessage::new("z", 0).with_body(DecodedMessageBody::Excesses))
                .with_child(transfer("w", 3)),
        );

    let found: Vec<_> = find_by_body_type(&tree, BodyKind::JettonInternalTransfer)
        .into_iter()
        .map(|n| n.in_msg.destination.as_deref().unwrap_or(""))
        .collect();
    assert_eq!(found, vec!["x", "y", "w"]);
    assert_eq!(find_by_body_type(&tree, BodyKind::Excesses).len(), 1);
}

#[test]
fn test_emulator_response_aggregates_to_net_output_and_gas() {
    let response: EmulationResponse = serde_json::from_value(serde_json::json!({
        "result": {
            "in_msg": {"src": SENDER, "dest": "0:router", "value": "1250000000"},
            "compute_phase": {"exit_code": 0},
            "children": [
                {
                    "in_msg": {"src": "0:router", "dest": "0:pool", "value": "1180000000"},
                    "compute_phase": {"exit_code": 0},
                    "children": [
                        {
                            "in_msg": {
                                "src": "0:pool",
                                "dest": JETTON_WALLET,
                                "value": "50000000",
                                "decoded_body": {"type": "jetton_internal_transfer", "amount": "3512000000"}
                            },
                            "compute_phase": {"exit_code": 0},
                            "children": []
                        },
                        {
                            "in_msg": {
                                "src": "0:pool",
                                "dest": SENDER,
                                "value": "40000000",
                                "decoded_op": "0xd53276db",
                                "decoded_body": {"type": "excesses"}
                            },
                            "compute_phase": {"exit_code": 0},
                            "children": []
                        }
                    ]
                }
            ]
        }
    }))
    .unwrap();

    let outcome = SwapOutputAggregator::default().compute_swap_output(&[EmulatedTransaction {
        message: message(1_250_000_000, 1_000_000_000),
        trace: response.result,
    }]);

    assert_eq!(outcome.output_amount, 3_512_000_000);
    // 250_000_000 attached beyond the input, 40_000_000 refunded.
    assert_eq!(outcome.gas_used, 210_000_000);
}

#[test]
fn test_net_gas_is_floored_at_zero() {
    let trace = TraceNode::new(TraceMessage::new("0:router", 1_010))
        .with_exit_code(0)
        .with_child(TraceNode::new(TraceMessage::new(SENDER, 900)).with_exit_code(0));

    let outcome = SwapOutputAggregator::default().compute_swap_output(&[EmulatedTransaction {
        message: message(1_010, 1_000),
        trace,
    }]);
    assert_eq!(outcome.gas_used, 0);
}

#[test]
fn test_payout_allowlist_is_injectable() {
    let trace = TraceNode::new(TraceMessage::new("0:router", 1_100))
        .with_exit_code(0)
        .with_child(
            TraceNode::new(TraceMessage::new(SENDER, 60).with_op("0xdeadbeef")).with_exit_code(0),
        );
    let tx = [EmulatedTransaction {
        message: message(1_100, 1_000),
        trace,
    }];

    assert_eq!(SwapOutputAggregator::default().compute_swap_output(&tx).gas_used, 40);
    let custom = SwapOutputAggregator::new(["0xDEADBEEF"]);
    assert_eq!(custom.compute_swap_output(&tx).gas_used, 100);
}
