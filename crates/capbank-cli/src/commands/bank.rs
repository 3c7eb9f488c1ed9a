//! Bank commands - operate on the persisted bank

use anyhow::bail;
use capbank_ledger::Bank;
use capbank_types::{AccountId, Amount, BankError, WITHDRAW_LIMIT};
use colored::*;

use crate::display;
use crate::store::Store;

/// Create a new bank state file
pub fn init(store: &Store, cap: Amount, endowment: Amount, force: bool) -> anyhow::Result<()> {
    let bank = Bank::with_endowment(cap, endowment);
    store.create(&bank, force)?;

    display::success(&format!("Bank created at {}", store.path().display()));
    display::kv("Cap", &display::units(cap));
    if !endowment.is_zero() {
        display::kv("Endowment", &display::units(endowment));
    }
    display::kv("Withdraw limit", &display::units(WITHDRAW_LIMIT));
    Ok(())
}

pub fn deposit(store: &Store, from: &AccountId, amount: Amount) -> anyhow::Result<()> {
    let (mut bank, wallets) = store.load()?;
    settle(bank.deposit(from, amount))?;
    store.save(&bank, &wallets)?;

    display::success(&format!(
        "Deposited {} for {}",
        display::units(amount),
        from.to_string().bright_white()
    ));
    display::kv("Balance", &display::units(bank.balance_of(from)));
    display::kv(
        "Held",
        &format!("{} of {}", bank.held_value(), display::units(bank.bank_cap())),
    );
    Ok(())
}

pub fn withdraw(store: &Store, to: &AccountId, amount: Amount) -> anyhow::Result<()> {
    let (mut bank, mut wallets) = store.load()?;
    settle(bank.withdraw(to, amount, &mut wallets))?;
    store.save(&bank, &wallets)?;

    display::success(&format!(
        "Paid {} to {}",
        display::units(amount),
        to.to_string().bright_white()
    ));
    display::kv("Balance", &display::units(bank.balance_of(to)));
    display::kv("Wallet", &display::units(wallets.holding(to)));
    Ok(())
}

pub fn balance(store: &Store, account: &AccountId) -> anyhow::Result<()> {
    let (bank, wallets) = store.load()?;

    println!("{}", format!("Account: {}", account).bright_white().bold());
    println!("{}", "─".repeat(40));
    display::kv("In bank", &display::units(bank.balance_of(account)));
    display::kv("In wallet", &display::units(wallets.holding(account)));
    Ok(())
}

pub fn status(store: &Store) -> anyhow::Result<()> {
    let (bank, wallets) = store.load()?;
    let books = bank.reconcile();

    display::section("capbank status");
    display::kv("State file", &store.path().display().to_string());
    display::kv("Cap", &display::units(bank.bank_cap()));
    display::kv("Held", &display::units(bank.held_value()));
    display::kv(
        "Headroom",
        &display::units(bank.bank_cap().saturating_sub(bank.held_value())),
    );
    display::kv("Endowment", &display::units(bank.endowment()));
    display::kv("Withdraw limit", &display::units(WITHDRAW_LIMIT));
    display::kv("Deposits", &bank.deposit_count().to_string());
    display::kv("Withdrawals", &bank.withdrawal_count().to_string());
    display::kv("Paid out", &display::units(wallets.total()));

    println!();
    let accounts = bank.accounts();
    if accounts.is_empty() {
        display::info("No account holds a balance");
    } else {
        for (account, balance) in &accounts {
            println!(
                "  {:<24} {}",
                account.to_string().bright_white(),
                display::units(*balance).bright_cyan()
            );
        }
    }

    println!();
    if books.is_balanced() {
        display::success("Books reconcile: held = balances + endowment");
    } else {
        let owed = books
            .liabilities
            .map_or_else(|| "more than can be represented".to_string(), display::units);
        display::warning(&format!(
            "Books do not reconcile: held {}, owed {}, endowment {}",
            display::units(books.held),
            owed,
            display::units(books.endowment)
        ));
    }
    Ok(())
}

pub fn events(store: &Store, limit: usize, json: bool) -> anyhow::Result<()> {
    let (bank, _) = store.load()?;
    let records = bank.events();
    let start = records.len().saturating_sub(limit);

    for record in &records[start..] {
        if json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            display::event(record);
        }
    }
    if records.is_empty() && !json {
        display::info("No events recorded");
    }
    Ok(())
}

/// Report a rejected operation and turn it into a failing exit status
fn settle(outcome: Result<(), BankError>) -> anyhow::Result<()> {
    if let Err(err) = outcome {
        display::rejected(&err);
        bail!("operation rejected: {}", err.kind());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fresh_store(dir: &tempfile::TempDir) -> Store {
        let store = Store::new(dir.path().join("state.json"));
        init(&store, Amount::units(100), Amount::zero(), false).unwrap();
        store
    }

    #[test]
    fn test_rejected_commands_leave_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = fresh_store(&dir);
        let alice = AccountId::from("alice");
        deposit(&store, &alice, Amount::units(60)).unwrap();
        let before = fs::read(store.path()).unwrap();

        assert!(deposit(&store, &alice, Amount::units(41)).is_err());
        assert!(deposit(&store, &alice, Amount::zero()).is_err());
        assert!(withdraw(&store, &alice, Amount::units(51)).is_err());
        assert!(withdraw(&store, &AccountId::from("bob"), Amount::units(1)).is_err());

        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_accepted_commands_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = fresh_store(&dir);
        let alice = AccountId::from("alice");

        deposit(&store, &alice, Amount::units(60)).unwrap();
        withdraw(&store, &alice, Amount::units(50)).unwrap();

        let (bank, wallets) = store.load().unwrap();
        assert_eq!(bank.balance_of(&alice), Amount::units(10));
        assert_eq!(wallets.holding(&alice), Amount::units(50));
        assert_eq!(bank.events().len(), 2);
    }

    #[test]
    fn test_rejection_reports_error_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = fresh_store(&dir);

        let err = withdraw(&store, &AccountId::from("alice"), Amount::units(1)).unwrap_err();

        assert!(err.to_string().contains("InsufficientBalance"));
    }
}
