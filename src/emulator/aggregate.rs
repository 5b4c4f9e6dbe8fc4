//! Net swap outcome recovery from emulated trace trees.

use super::trace::{BodyKind, TraceNode};
use super::UnsignedMessage;
use tracing::debug;

/// Operation codes whose messages carry real swap output back to the sender.
///
/// Written without the separating comma, this list collapses into the single
/// string `"0x474f86cf0x01f3835d"`, which matches no op code. Every
/// successful message back to the sender then counts as a refund, and gas
/// comes out lower on routes with payouts. Gas figures from runs with that
/// collapsed list are reproduced by passing the concatenated string through
/// `PAYOUT_OP_CODES`.
pub const DEFAULT_PAYOUT_OP_CODES: &[&str] = &[
    "0x474f86cf", // dedust payout
    "0x01f3835d", // pton transfer
];

/// One submitted message and the trace it produced.
#[derive(Debug, Clone)]
pub struct EmulatedTransaction {
    pub message: UnsignedMessage,
    pub trace: TraceNode,
}

/// Net result of a route's emulated execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapOutcome {
    pub output_amount: u128,
    pub gas_used: u128,
}

/// Visit every node of `root` in depth-first pre-order.
pub fn traverse<'a, F>(root: &'a TraceNode, visit: &mut F)
where
    F: FnMut(&'a TraceNode),
{
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visit(node);
        stack.extend(node.children.iter().rev());
    }
}

/// Nodes whose incoming message decodes to `kind`, in pre-order.
pub fn find_by_body_type(root: &TraceNode, kind: BodyKind) -> Vec<&TraceNode> {
    let mut found = Vec::new();
    traverse(root, &mut |node| {
        if node.body_kind() == kind {
            found.push(node);
        }
    });
    found
}

/// Computes net output and net gas over a route's emulated transactions.
///
/// Refunds are recognised structurally: a successful transaction whose
/// incoming message goes back to the sender and is not a known payout
/// operation. Some routers refund without a distinguishing exit code, so the
/// payout allowlist decides what counts as output and what counts as refund,
/// and is a known source of measurement noise.
#[derive(Debug, Clone)]
pub struct SwapOutputAggregator {
    payout_op_codes: Vec<String>,
}

impl SwapOutputAggregator {
    pub fn new<I, S>(payout_op_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            payout_op_codes: payout_op_codes
                .into_iter()
                .map(|op| op.as_ref().trim().to_ascii_lowercase())
                .filter(|op| !op.is_empty())
                .collect(),
        }
    }

    pub fn payout_op_codes(&self) -> &[String] {
        &self.payout_op_codes
    }

    fn is_payout(&self, op: Option<&str>) -> bool {
        op.is_some_and(|op| {
            self.payout_op_codes
                .iter()
                .any(|known| known.eq_ignore_ascii_case(op))
        })
    }

    pub fn compute_swap_output(&self, transactions: &[EmulatedTransaction]) -> SwapOutcome {
        let mut total_output: u128 = 0;
        let mut total_gas: i128 = 0;
        let mut total_excess: i128 = 0;

        for tx in transactions {
            let sender = tx.message.source.as_str();
            let receiving_wallet = tx.message.counterparty_wallet.as_str();

            for node in find_by_body_type(&tx.trace, BodyKind::JettonInternalTransfer) {
                if node.in_msg.is_destined_to(receiving_wallet) {
                    let amount = node
                        .in_msg
                        .decoded_body
                        .as_ref()
                        .and_then(|b| b.transfer_amount())
                        .unwrap_or(0);
                    total_output = total_output.saturating_add(amount);
                }
            }

            total_gas += as_signed(tx.trace.in_msg.value) - as_signed(tx.message.swap_input_amount);

            traverse(&tx.trace, &mut |node| {
                if !node.in_msg.is_destined_to(sender) || node.compute_exit_code() != Some(0) {
                    return;
                }
                if self.is_payout(node.in_msg.decoded_op.as_deref()) {
                    debug!(op = ?node.in_msg.decoded_op, value = node.in_msg.value, "Payout to sender, not a refund");
                    return;
                }
                total_excess += as_signed(node.in_msg.value);
            });
        }

        let net_gas = total_gas - total_excess;

        SwapOutcome {
            output_amount: total_output,
            gas_used: u128::try_from(net_gas.max(0)).unwrap_or(0),
        }
    }
}

impl Default for SwapOutputAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_PAYOUT_OP_CODES)
    }
}

fn as_signed(value: u128) -> i128 {
    i128::try_from(value).unwrap_or(i128::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::trace::{DecodedMessageBody, TraceMessage};

    const SENDER: &str = "0:sender";
    const JETTON_WALLET: &str = "0:jw";

    fn leaf(dest: &str, value: u128) -> TraceNode {
        TraceNode::new(TraceMessage::new(dest, value)).with_exit_code(0)
    }

    fn message(value: u128, swap_input_amount: u128) -> UnsignedMessage {
        UnsignedMessage {
            source: SENDER.to_string(),
            destination: "0:router".to_string(),
            body: String::new(),
            value,
            swap_input_amount,
            counterparty_wallet: JETTON_WALLET.to_string(),
        }
    }

    fn sample_tree() -> TraceNode {
        // root(a) -> [b -> [d], c]
        TraceNode::new(TraceMessage::new("a", 1))
            .with_child(TraceNode::new(TraceMessage::new("b", 2)).with_child(leaf("d", 4)))
            .with_child(leaf("c", 3))
    }

    #[test]
    fn test_traverse_pre_order() {
        let tree = sample_tree();
        let mut seen = Vec::new();
        traverse(&tree, &mut |n| seen.push(n.in_msg.destination.clone().unwrap()));
        assert_eq!(seen, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_find_by_body_type_preserves_order() {
        let tree = TraceNode::new(TraceMessage::new("root", 0))
            .with_child(
                TraceNode::new(
                    TraceMessage::new("x", 0).with_body(DecodedMessageBody::jetton_transfer(1)),
                )
                .with_child(TraceNode::new(
                    TraceMessage::new("y", 0).with_body(DecodedMessageBody::Excesses),
                ))
                .with_child(TraceNode::new(
                    TraceMessage::new("z", 0).with_body(DecodedMessageBody::jetton_transfer(2)),
                )),
            )
            .with_child(TraceNode::new(
                TraceMessage::new("w", 0).with_body(DecodedMessageBody::jetton_transfer(3)),
            ));

        let found: Vec<_> = find_by_body_type(&tree, BodyKind::JettonInternalTransfer)
            .into_iter()
            .map(|n| n.in_msg.body_kind())
            .collect();
        assert_eq!(found.len(), 3);

        let amounts: Vec<_> = find_by_body_type(&tree, BodyKind::JettonInternalTransfer)
            .into_iter()
            .filter_map(|n| n.in_msg.decoded_body.as_ref().and_then(|b| b.transfer_amount()))
            .collect();
        assert_eq!(amounts, vec![1, 2, 3]);
        assert_eq!(find_by_body_type(&tree, BodyKind::Excesses).len(), 1);
    }

    #[test]
    fn test_output_counts_only_receiving_wallet() {
        let trace = TraceNode::new(TraceMessage::new("0:router", 1_100))
            .with_exit_code(0)
            .with_child(TraceNode::new(
                TraceMessage::new("0:JW", 0).with_body(DecodedMessageBody::jetton_transfer(500)),
            ))
            .with_child(TraceNode::new(
                TraceMessage::new("0:pool_wallet", 0)
                    .with_body(DecodedMessageBody::jetton_transfer(9_999)),
            ));

        let outcome = SwapOutputAggregator::default().compute_swap_output(&[EmulatedTransaction {
            message: message(1_100, 1_000),
            trace,
        }]);
        assert_eq!(outcome.output_amount, 500);
        assert_eq!(outcome.gas_used, 100);
    }

    #[test]
    fn test_refunds_reduce_gas_but_payouts_do_not() {
        let trace = TraceNode::new(TraceMessage::new("0:router", 1_300))
            .with_exit_code(0)
            .with_child(leaf(SENDER, 40))
            .with_child(
                TraceNode::new(TraceMessage::new(SENDER, 70).with_op("0x474F86CF")).with_exit_code(0),
            )
            .with_child(TraceNode::new(TraceMessage::new(SENDER, 25)).with_exit_code(9));

        let outcome = SwapOutputAggregator::default().compute_swap_output(&[EmulatedTransaction {
            message: message(1_300, 1_000),
            trace,
        }]);
        // 300 spent beyond input, 40 refunded; payout and failed tx ignored.
        assert_eq!(outcome.gas_used, 260);
    }

    #[test]
    fn test_net_gas_floors_at_zero() {
        let trace = TraceNode::new(TraceMessage::new("0:router", 1_050))
            .with_exit_code(0)
            .with_child(leaf(SENDER, 5_000));

        let outcome = SwapOutputAggregator::new(Vec::<String>::new()).compute_swap_output(&[
            EmulatedTransaction {
                message: message(1_050, 1_000),
                trace,
            },
        ]);
        assert_eq!(outcome.gas_used, 0);
    }

    #[test]
    fn test_sums_across_split_messages() {
        let split = |value: u128, out: u128| EmulatedTransaction {
            message: message(value, 500),
            trace: TraceNode::new(TraceMessage::new("0:router", value)).with_child(TraceNode::new(
                TraceMessage::new(JETTON_WALLET, 0).with_body(DecodedMessageBody::jetton_transfer(out)),
            )),
        };

        let outcome =
            SwapOutputAggregator::default().compute_swap_output(&[split(600, 10), split(550, 20)]);
        assert_eq!(outcome.output_amount, 30);
        assert_eq!(outcome.gas_used, 150);
    }

    #[test]
    fn test_concatenated_allowlist_counts_payouts_as_refunds() {
        let trace = || {
            TraceNode::new(TraceMessage::new("0:router", 1_300))
                .with_exit_code(0)
                .with_child(
                    TraceNode::new(TraceMessage::new(SENDER, 70).with_op("0x474f86cf"))
                        .with_exit_code(0),
                )
        };
        let tx = || EmulatedTransaction {
            message: message(1_300, 1_000),
            trace: trace(),
        };

        let fixed = SwapOutputAggregator::default().compute_swap_output(&[tx()]);
        let collapsed = SwapOutputAggregator::new(["0x474f86cf0x01f3835d"]).compute_swap_output(&[tx()]);
        assert_eq!(fixed.gas_used, 300);
        assert_eq!(collapsed.gas_used, 230);
    }

    #[test]
    fn test_payout_codes_are_normalized() {
        let agg = SwapOutputAggregator::new([" 0xABC ", ""]);
        assert_eq!(agg.payout_op_codes(), &["0xabc".to_string()]);
    }
}
