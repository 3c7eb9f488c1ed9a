//! Demo commands - in-memory walkthroughs, nothing is persisted

use capbank_ledger::{Bank, Recipient, RefusingRecipient, SharedBank, TransferRefused, Wallets};
use capbank_types::{AccountId, Amount, WITHDRAW_LIMIT};
use colored::*;

use crate::display;

/// Recipient that tries to withdraw again every time it is paid
struct Reenterer {
    wallets: Wallets,
    attempts_left: u32,
}

impl Recipient for Reenterer {
    fn on_receive(
        &mut self,
        bank: &mut Bank,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TransferRefused> {
        self.wallets.on_receive(bank, to, amount)?;
        let indent = "  ".repeat(bank.call_depth() as usize);
        display::info(&format!(
            "{}received {} at depth {}; bank still owes {}",
            indent,
            display::units(amount),
            bank.call_depth(),
            display::units(bank.balance_of(to))
        ));

        if self.attempts_left == 0 {
            return Ok(());
        }
        self.attempts_left -= 1;
        display::info(&format!("{}reentering withdraw({})", indent, amount));
        if let Err(err) = bank.withdraw(to, amount, self) {
            display::rejected(&err);
        }
        Ok(())
    }
}

/// Show that nested withdrawals only ever see the decremented balance
pub fn reentrancy(attempts: u32) -> anyhow::Result<()> {
    display::section("Reentrancy: effects before interaction");

    let attacker = AccountId::from("attacker");
    let mut bank = Bank::new(Amount::units(1_000));
    let deposit = Amount::units(120);
    bank.deposit(&attacker, deposit)?;
    display::success(&format!("attacker deposited {}", display::units(deposit)));

    let mut recipient = Reenterer {
        wallets: Wallets::new(),
        attempts_left: attempts,
    };
    display::info(&format!(
        "attacker withdraws {} with {} reentry attempts",
        display::units(WITHDRAW_LIMIT),
        attempts
    ));
    bank.withdraw(&attacker, WITHDRAW_LIMIT, &mut recipient)?;

    println!();
    let paid = recipient.wallets.holding(&attacker);
    display::kv("Paid out", &display::units(paid));
    display::kv("Left in bank", &display::units(bank.balance_of(&attacker)));
    display::kv("Withdrawals", &bank.withdrawal_count().to_string());
    if paid <= deposit && bank.reconcile().is_balanced() {
        display::success("Total paid never exceeded the deposit");
    } else {
        display::warning("Payout exceeded the deposit");
    }

    display::section("Rollback: refused transfer");
    let mut refusing = RefusingRecipient::new("recipient rejects native value");
    let before = bank.balance_of(&attacker);
    match bank.withdraw(&attacker, Amount::units(5), &mut refusing) {
        Ok(()) => display::warning("refusing recipient was paid"),
        Err(err) => display::rejected(&err),
    }
    display::kv(
        "Balance",
        &format!(
            "{} -> {}",
            display::units(before),
            display::units(bank.balance_of(&attacker))
        ),
    );
    display::kv("Withdrawals", &bank.withdrawal_count().to_string());
    Ok(())
}

/// Race many tasks against one shared bank near its cap
pub async fn contention(tasks: usize) -> anyhow::Result<()> {
    display::section("Contention: serialized invocations");

    let cap = Amount::units(100);
    let shared = SharedBank::new(Bank::new(cap));
    let mut handles = Vec::with_capacity(tasks);
    for i in 0..tasks {
        let shared = shared.clone();
        handles.push(tokio::spawn(async move {
            let account = AccountId::new(format!("depositor-{}", i));
            let amount = Amount::units((i % 7 + 1) as u64 * 3);
            (account.clone(), amount, shared.deposit(&account, amount).await)
        }));
    }

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for handle in handles {
        let (account, amount, outcome) = handle.await?;
        match outcome {
            Ok(()) => {
                accepted += 1;
                display::success(&format!("{} deposited {}", account, display::units(amount)));
            }
            Err(err) => {
                rejected += 1;
                println!(
                    "  {} {} {}",
                    "✗".bright_red(),
                    account,
                    format!("[{}]", err.kind()).bright_red()
                );
            }
        }
    }

    let books = shared.reconcile().await;
    println!();
    display::kv("Accepted", &accepted.to_string());
    display::kv("Rejected", &rejected.to_string());
    display::kv("Held", &format!("{} of {}", books.held, display::units(cap)));
    if books.is_balanced() && books.held <= cap {
        display::success("Cap held and books reconcile");
    } else {
        display::warning("Books do not reconcile");
    }
    Ok(())
}
