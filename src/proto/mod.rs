// proto 生成コードをインクルード。
// prost-build (tonic-build) によって生成されたファイルを使用。
// protoc が利用できない環境ではチェックイン済みの生成コードをそのまま使う。

pub mod auth {
    pub mod v1 {
        include!("auth.v1.rs");
    }
}
pub mod account {
    pub mod v1 {
        include!("account.v1.rs");
    }
}
