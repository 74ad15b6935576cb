fn main() -> Result<(), Box<dyn std::error::Error>> {
    let auth_proto = "proto/v1/auth.proto";
    let account_proto = "proto/v1/account.proto";
    let proto_include = "proto";

    // proto ファイルが存在し、protoc が利用可能な場合のみコード生成を実行する。
    // それ以外の環境では src/proto/ にチェックイン済みの生成コードを使用する。
    if !std::path::Path::new(auth_proto).exists() {
        println!(
            "cargo:warning=Proto file not found, skipping tonic codegen: {}",
            auth_proto
        );
        return Ok(());
    }

    match tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .out_dir("src/proto")
        .compile_protos(&[auth_proto, account_proto], &[proto_include])
    {
        Ok(()) => {
            println!("cargo:warning=tonic-build succeeded for auth proto");
        }
        Err(e) => {
            println!(
                "cargo:warning=tonic-build failed (protoc may not be installed): {}",
                e
            );
        }
    }
    Ok(())
}
