use capbank_ledger::{Bank, BankError, Wallets};
use capbank_types::{AccountId, Amount, WITHDRAW_LIMIT};
use proptest::prelude::*;

const ACCOUNTS: [&str; 3] = ["alice", "bob", "carol"];

#[derive(Debug, Clone)]
enum Op {
    Deposit { who: usize, units: u64 },
    Withdraw { who: usize, units: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ACCOUNTS.len(), 0u64..120).prop_map(|(who, units)| Op::Deposit { who, units }),
        (0..ACCOUNTS.len(), 0u64..60).prop_map(|(who, units)| Op::Withdraw { who, units }),
    ]
}

proptest! {
    #[test]
    fn deposits_within_cap_credit_exactly(amounts in prop::collection::vec(1u64..1_000, 1..30)) {
        let mut bank = Bank::new(Amount::units(1_000_000));
        let alice = AccountId::from("alice");

        for (i, units) in amounts.iter().enumerate() {
            let before = bank.balance_of(&alice);
            bank.deposit(&alice, Amount::units(*units)).unwrap();
            prop_assert_eq!(
                bank.balance_of(&alice),
                before.checked_add(Amount::units(*units)).unwrap()
            );
            prop_assert_eq!(bank.deposit_count(), i as u64 + 1);
        }
    }

    #[test]
    fn withdraw_above_limit_always_rejected(extra in 1u128..1_000_000, deposit in 1u64..500) {
        let mut bank = Bank::new(Amount::units(1_000));
        let mut wallets = Wallets::new();
        let alice = AccountId::from("alice");
        bank.deposit(&alice, Amount::units(deposit)).unwrap();

        let request = Amount::new(WITHDRAW_LIMIT.base_units() + extra);
        let result = bank.withdraw(&alice, request, &mut wallets);

        let is_limit_error = matches!(result, Err(BankError::WithdrawLimitExceeded { .. }));
        prop_assert!(is_limit_error);
        prop_assert_eq!(bank.balance_of(&alice), Amount::units(deposit));
    }

    #[test]
    fn books_stay_balanced_under_any_sequence(ops in prop::collection::vec(op(), 1..60)) {
        let cap = Amount::units(400);
        let mut bank = Bank::new(cap);
        let mut wallets = Wallets::new();
        let mut deposited = Amount::zero();

        for op in ops {
            let deposits_before = bank.deposit_count();
            let withdrawals_before = bank.withdrawal_count();
            match op {
                Op::Deposit { who, units } => {
                    let account = AccountId::from(ACCOUNTS[who]);
                    if bank.deposit(&account, Amount::units(units)).is_ok() {
                        deposited = deposited.checked_add(Amount::units(units)).unwrap();
                        prop_assert_eq!(bank.deposit_count(), deposits_before + 1);
                    } else {
                        prop_assert_eq!(bank.deposit_count(), deposits_before);
                    }
                }
                Op::Withdraw { who, units } => {
                    let account = AccountId::from(ACCOUNTS[who]);
                    let before = bank.balance_of(&account);
                    match bank.withdraw(&account, Amount::units(units), &mut wallets) {
                        Ok(()) => {
                            prop_assert_eq!(
                                bank.balance_of(&account),
                                before.checked_sub(Amount::units(units)).unwrap()
                            );
                            prop_assert_eq!(bank.withdrawal_count(), withdrawals_before + 1);
                        }
                        Err(_) => {
                            prop_assert_eq!(bank.balance_of(&account), before);
                            prop_assert_eq!(bank.withdrawal_count(), withdrawals_before);
                        }
                    }
                }
            }

            prop_assert!(bank.reconcile().is_balanced());
            prop_assert!(bank.held_value() <= cap);
            // value is conserved between the bank and the outside wallets
            prop_assert_eq!(
                bank.held_value().checked_add(wallets.total()).unwrap(),
                deposited
            );
        }
    }
}
