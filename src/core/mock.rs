// canned answers for running without a model
// keyword rules over the lowercased question, english and turkish

const TOP_BALANCES: &str = "
SELECT c.first_name, c.last_name, a.balance_try
FROM accounts a
JOIN customers c ON c.customer_no = a.customer_no
ORDER BY a.balance_try DESC
LIMIT 5;
";

const RECENT_TRANSACTIONS: &str = "
SELECT transaction_no, account_no, transaction_type, amount, currency, transaction_time
FROM transactions
ORDER BY transaction_time DESC
LIMIT 20;
";

const ISTANBUL_ACCOUNTS: &str = "
SELECT a.account_no, c.first_name, c.last_name, a.account_type, a.balance_try
FROM accounts a
JOIN customers c ON c.customer_no = a.customer_no
JOIN branches b ON b.branch_code = a.branch_code
WHERE b.city = 'İstanbul' OR b.city = 'Istanbul'
ORDER BY a.balance_try DESC
LIMIT 50;
";

const CREDIT_DECISIONS: &str = "
SELECT decision, COUNT(*) AS cnt
FROM credit_applications
GROUP BY decision
ORDER BY cnt DESC;
";

const CUSTOMERS: &str =
    "SELECT customer_no, first_name, last_name, residence_city FROM customers ORDER BY customer_no LIMIT 10;";

/// Pick a canned query for the question.
pub fn generate(question: &str) -> &'static str {
    let q = question.trim().to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| q.contains(w));

    if has(&["top"]) && has(&["balance", "bakiye"]) {
        return TOP_BALANCES;
    }

    if has(&["recent", "son"]) && has(&["transactions", "işlemler"]) {
        return RECENT_TRANSACTIONS;
    }

    if has(&["istanbul"]) && has(&["accounts", "hesap"]) {
        return ISTANBUL_ACCOUNTS;
    }

    if has(&["kredi", "credit"]) && has(&["redded", "rejected"]) {
        return CREDIT_DECISIONS;
    }

    CUSTOMERS
}
