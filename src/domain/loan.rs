use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, PatronId, ReturnLoanError};

/// 貸出ステータス
///
/// returned_atの有無から導出される。保存はしない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// 貸出中（returned_atなし）
    Outstanding,
    /// 返却済み
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Outstanding => "outstanding",
            LoanStatus::Returned => "returned",
        }
    }
}

/// まだ採番されていない貸出記録
///
/// 貸出リクエスト成功時に作成され、ストレージに追加されるとIDが付く。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: BookId,
    pub patron_id: PatronId,
    pub borrowed_at: DateTime<Utc>,
}

impl NewLoan {
    /// ストレージが採番したIDを付けて貸出記録にする
    pub fn with_id(self, loan_id: LoanId) -> Loan {
        Loan {
            loan_id,
            book_id: self.book_id,
            patron_id: self.patron_id,
            borrowed_at: self.borrowed_at,
            returned_at: None,
        }
    }
}

/// 貸出記録 - 1冊の書籍の1回の貸出・返却サイクル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub patron_id: PatronId,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        if self.returned_at.is_some() {
            LoanStatus::Returned
        } else {
            LoanStatus::Outstanding
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// 純粋関数：書籍を貸し出す
///
/// NoLoan → Outstanding の遷移。returned_atは常に未設定。
pub fn borrow_book(book_id: BookId, patron_id: PatronId, borrowed_at: DateTime<Utc>) -> NewLoan {
    NewLoan {
        book_id,
        patron_id,
        borrowed_at,
    }
}

/// 純粋関数：書籍を返却する
///
/// Outstanding → Returned の遷移。returned_at以外のフィールドは変更しない。
/// Returnedは終端状態のため、二重返却はエラーになる。
pub fn return_book(loan: &Loan, returned_at: DateTime<Utc>) -> Result<Loan, ReturnLoanError> {
    if !loan.is_outstanding() {
        return Err(ReturnLoanError::AlreadyReturned);
    }

    Ok(Loan {
        returned_at: Some(returned_at),
        ..loan.clone()
    })
}

/// 貸出中の記録を決定的に1件選ぶ
///
/// 同じ(書籍, 利用者)に複数の記録がある場合の規則：
/// returned_atなしの中でborrowed_atが最新のもの、同時刻ならloan_idが大きいもの。
pub fn select_outstanding<'a, I>(loans: I) -> Option<&'a Loan>
where
    I: IntoIterator<Item = &'a Loan>,
{
    loans
        .into_iter()
        .filter(|loan| loan.is_outstanding())
        .max_by_key(|loan| (loan.borrowed_at, loan.loan_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ids() -> (BookId, PatronId) {
        (BookId::new(1).unwrap(), PatronId::new(1).unwrap())
    }

    fn outstanding(loan_id: i64, borrowed_at: DateTime<Utc>) -> Loan {
        let (book_id, patron_id) = ids();
        borrow_book(book_id, patron_id, borrowed_at).with_id(LoanId::new(loan_id).unwrap())
    }

    #[test]
    fn test_borrow_book_creates_outstanding_loan() {
        let (book_id, patron_id) = ids();
        let borrowed_at = Utc::now();

        let new_loan = borrow_book(book_id, patron_id, borrowed_at);
        let loan = new_loan.with_id(LoanId::new(10).unwrap());

        assert_eq!(loan.book_id, book_id);
        assert_eq!(loan.patron_id, patron_id);
        assert_eq!(loan.borrowed_at, borrowed_at);
        assert_eq!(loan.returned_at, None);
        assert_eq!(loan.status(), LoanStatus::Outstanding);
    }

    #[test]
    fn test_return_book_sets_only_returned_at() {
        let borrowed_at = Utc::now();
        let loan = outstanding(1, borrowed_at);
        let returned_at = borrowed_at + Duration::days(3);

        let returned = return_book(&loan, returned_at).unwrap();

        assert_eq!(returned.returned_at, Some(returned_at));
        assert_eq!(returned.status(), LoanStatus::Returned);
        // 他のフィールドは変わらない
        assert_eq!(
            Loan {
                returned_at: None,
                ..returned
            },
            loan
        );
    }

    #[test]
    fn test_return_book_fails_when_already_returned() {
        let borrowed_at = Utc::now();
        let loan = outstanding(1, borrowed_at);
        let returned = return_book(&loan, borrowed_at + Duration::days(1)).unwrap();

        // 2回目の返却は失敗
        let result = return_book(&returned, borrowed_at + Duration::days(2));
        assert_eq!(result.unwrap_err(), ReturnLoanError::AlreadyReturned);
    }

    #[test]
    fn test_select_outstanding_skips_returned_records() {
        let now = Utc::now();
        let old = outstanding(1, now - Duration::days(30));
        let returned = return_book(&outstanding(2, now), now + Duration::hours(1)).unwrap();

        let loans = [old.clone(), returned];
        let selected = select_outstanding(loans.iter());

        assert_eq!(selected, Some(&old));
    }

    #[test]
    fn test_select_outstanding_prefers_most_recent_borrow() {
        let now = Utc::now();
        let older = outstanding(5, now - Duration::days(2));
        let newer = outstanding(3, now);

        let loans = [older, newer.clone()];
        assert_eq!(select_outstanding(loans.iter()), Some(&newer));
    }

    #[test]
    fn test_select_outstanding_breaks_ties_by_loan_id() {
        let now = Utc::now();
        let low = outstanding(1, now);
        let high = outstanding(2, now);

        let loans = [high.clone(), low];
        assert_eq!(select_outstanding(loans.iter()), Some(&high));
    }

    #[test]
    fn test_select_outstanding_none_when_all_returned() {
        let now = Utc::now();
        let returned = return_book(&outstanding(1, now), now).unwrap();

        assert_eq!(select_outstanding([returned].iter()), None);
    }

    #[test]
    fn test_loan_status_as_str() {
        assert_eq!(LoanStatus::Outstanding.as_str(), "outstanding");
        assert_eq!(LoanStatus::Returned.as_str(), "returned");
    }
}
